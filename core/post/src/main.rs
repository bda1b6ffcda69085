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
use common::ports::outbound::{Clock, Log, LogLevel, LogRecord};
use config::PostConfig;
use wiring::{wire_aggregator, wire_base, wire_log, wire_post_loop, Base};

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("post: {}", e);
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
    let config = PostConfig::resolve(&args, base.env.as_ref())?;
    let log = wire_log(&base, &config);

    let result = dispatch(&base, &config, &args, Arc::clone(&log));
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
    base: &Base,
    config: &PostConfig,
    args: &CliArgs,
    log: Arc<dyn Log>,
) -> Result<i32, Error> {
    if args.show_context {
        let context = wire_aggregator(base, config, log).aggregate(
            base.clock.now(),
            config.window,
            config.limit,
        );
        println!("{}", context);
        return Ok(0);
    }

    let _ = log.log(
        &LogRecord::new(LogLevel::Info, "post started")
            .with_layer("cli")
            .with_kind("lifecycle")
            .with_field("event_log", config.event_log.display().to_string())
            .with_field("publish_enabled", config.publish_enabled)
            .with_field("dry_run", config.dry_run),
    );
    let post_loop = wire_post_loop(base, config, log)?;
    post_loop.run(args.once.then_some(1));
    Ok(0)
}

fn print_usage() {
    eprintln!("Usage: post [options]");
}

fn print_help() {
    println!("Usage: post [options]");
    println!("Options:");
    println!("  -h, --help                 Show this help message");
    println!("  --once                     Run a single decision cycle and exit");
    println!("  --show-context             Print the aggregated context for now and exit");
    println!("  --dry-run                  Log approved commentary instead of publishing it");
    println!("  --publish                  Enable publishing (PUBLISH_ENABLED, default false)");
    println!("  --channel <name>           Stream channel (TWITCH_CHANNEL)");
    println!("  --interval <minutes>       Minutes between decisions (POST_INTERVAL, default 5)");
    println!("  --window <minutes>         Context window (CONTEXT_WINDOW, default 5)");
    println!("  --limit <n>                Maximum events in the context (CONTEXT_LIMIT)");
    println!("  --event-log <path>         Event log (EVENT_LOG, default context/monitor/context.jsonl)");
    println!("  --post-log <path>          Post log (POST_LOG, default context/post/posts.jsonl)");
    println!("  --notes-file <path>        Notes (NOTES_FILE, default context/post/notes.txt)");
    println!("  --webhook-url <url>        Publishing webhook (PUBLISH_WEBHOOK_URL)");
    println!("  --backends <path>          Backends JSON file (BACKENDS_CONFIG)");
    println!("  --log-dir <dir>            Directory for post.jsonl (LOG_DIR, default logs)");
    println!("  --generate <shell>         Generate shell completion script (bash, zsh, fish)");
    println!();
    println!("Publishing happens only when enabled, the model approves, the commentary is");
    println!("non-empty and the notes file already has content.");
}
