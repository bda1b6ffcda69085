mod adapter;
mod cli;
mod config;
mod ports;
mod prompts;
mod usecase;
mod wiring;

#[cfg(test)]
mod tests;

use std::process;
use std::sync::Arc;

use cli::{parse_args, print_completion, CliArgs, ParseOutcome};
use common::error::Error;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use config::MonitorConfig;
use wiring::{wire_analyzer, wire_base, wire_log, wire_monitor_loop};

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("monitor: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

pub fn run() -> Result<i32, Error> {
    let args = match parse_args()? {
        ParseOutcome::Args(a) => a,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell);
            return Ok(0);
        }
    };
    if args.help {
        print_help();
        return Ok(0);
    }

    let base = wire_base();
    let config = MonitorConfig::resolve(&args, base.env.as_ref())?;
    let log = wire_log(&base, &config);

    let result = dispatch(&base, &config, &args, log.clone());
    if let Err(ref e) = result {
        let _ = log.log(
            &LogRecord::new(LogLevel::Error, e.to_string())
                .with_layer("cli")
                .with_kind("error"),
        );
    }
    result
}

fn dispatch(
    base: &wiring::Base,
    config: &MonitorConfig,
    args: &CliArgs,
    log: Arc<dyn Log>,
) -> Result<i32, Error> {
    if let Some(image) = &args.analyze {
        let analyzer = wire_analyzer(base, config, log)?;
        let event = analyzer.analyze(image);
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(if event.is_failure() { 1 } else { 0 });
    }

    let _ = log.log(
        &LogRecord::new(LogLevel::Info, "monitor started")
            .with_layer("cli")
            .with_kind("lifecycle")
            .with_field("channel", config.channel.as_str())
            .with_field("event_log", config.event_log.display().to_string()),
    );
    let monitor = wire_monitor_loop(base, config, log)?;
    monitor.run(args.once.then_some(1));
    Ok(0)
}

fn print_usage() {
    eprintln!("Usage: monitor [options]");
}

fn print_help() {
    println!("Usage: monitor [options]");
    println!("Options:");
    println!("  -h, --help                   Show this help message");
    println!("  --once                       Run a single capture cycle and exit");
    println!("  --analyze <image>            Analyze one image, print the event JSON and exit");
    println!("  --channel <name>             Stream channel (TWITCH_CHANNEL)");
    println!("  --interval <minutes>         Minutes between captures (MONITOR_INTERVAL, default 0.5)");
    println!("  --boot-wait <minutes>        Wait before the first capture (AGENT_BOOT_WAIT, default 0)");
    println!("  --images-dir <dir>           Screenshot directory (IMAGES_DIR, default context/images)");
    println!("  --event-log <path>           Event log (EVENT_LOG, default context/monitor/context.jsonl)");
    println!("  --capture-command <cmd>      Shell command writing a PNG to $OUTPUT_PATH (CAPTURE_COMMAND)");
    println!("  --max-images <n>             Screenshots kept by cleanup (MAX_IMAGES, default 20)");
    println!("  --backends <path>            Backends JSON file (BACKENDS_CONFIG)");
    println!("  --instruction-file <path>    Replace the built-in analysis instruction");
    println!("  --log-dir <dir>              Directory for monitor.jsonl (LOG_DIR, default logs)");
    println!("  --generate <shell>           Generate shell completion script (bash, zsh, fish)");
    println!();
    println!("Environment:");
    println!("  OPENROUTER_API_KEY   API key for the chat completions backend (name configurable in the backends file)");
    println!("  STREAM_CHANNEL and OUTPUT_PATH are set for the capture command.");
}
