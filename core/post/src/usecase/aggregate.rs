//! EventLog から時間窓の文脈を組み立てる
//!
//! 窓 `[reference - window, reference]` に入り、要約が空でない Event だけを新しい順に並べ、
//! 1 から id を振る。id はこの集約の中だけで有効（Post の image_id が参照する）。

use chrono::{DateTime, Duration, Utc};
use common::domain::{Event, TeamMember};
use common::jsonl::EventLog;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// 集約された 1 件
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub id: u32,
    pub relative_time: String,
    pub event: Event,
}

/// 最高スコアの Event（同点なら新しい方）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighestScore {
    pub id: u32,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedContext {
    pub entries: Vec<ContextEntry>,
    pub count: usize,
    pub avg_score: f64,
    pub highest: Option<HighestScore>,
}

impl AggregatedContext {
    fn from_sorted(reference: DateTime<Utc>, events: Vec<Event>) -> Self {
        let entries: Vec<ContextEntry> = events
            .into_iter()
            .zip(1u32..)
            .map(|(event, id)| ContextEntry {
                id,
                relative_time: relative_time(reference, event.timestamp),
                event,
            })
            .collect();

        let count = entries.len();
        let avg_score = if count == 0 {
            0.0
        } else {
            entries.iter().map(|e| f64::from(e.event.score)).sum::<f64>() / count as f64
        };

        let mut highest: Option<HighestScore> = None;
        for entry in &entries {
            if highest.map_or(true, |h| entry.event.score > h.score) {
                highest = Some(HighestScore {
                    id: entry.id,
                    score: entry.event.score,
                });
            }
        }

        Self {
            entries,
            count,
            avg_score,
            highest,
        }
    }

    /// Post の image_id をこの集約の画像パスに解決する
    pub fn image_path_for(&self, id: u32) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.event.image_path.as_path())
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// 経過時間の表示: 60 秒未満は "1 min ago"、60 分未満は "N min ago"、それ以上は "N hr ago"
pub fn relative_time(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    let mins = secs / 60;
    if secs < 60 {
        "1 min ago".to_string()
    } else if mins < 60 {
        format!("{} min ago", mins)
    } else {
        format!("{} hr ago", mins / 60)
    }
}

fn describe_team(team: &[TeamMember]) -> String {
    let members: Vec<String> = team
        .iter()
        .map(|m| format!("{}/{} ({})", m.name, m.custom_name, m.health))
        .collect();
    match members.len() {
        0 => "no team data".to_string(),
        1 => format!("1 member: {}", members[0]),
        n => format!("{} members: {}", n, members.join(", ")),
    }
}

fn describe_location(location: &str) -> &str {
    let trimmed = location.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        "unknown"
    } else {
        trimmed
    }
}

/// モデルに渡す文脈文字列。0 件なら空文字列。
impl fmt::Display for AggregatedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(highest) = self.highest else {
            return Ok(());
        };
        writeln!(
            f,
            "Summary: {} events, average score {:.2}, highest score {} (event {})",
            self.count, self.avg_score, highest.score, highest.id
        )?;
        writeln!(f, "<recent_events>")?;
        for entry in &self.entries {
            let e = &entry.event;
            writeln!(f, "<event id=\"{}\">", entry.id)?;
            writeln!(f, "time: {}", entry.relative_time)?;
            writeln!(f, "score: {}", e.score)?;
            writeln!(f, "summary: {}", e.detailed_summary)?;
            writeln!(f, "team: {}", describe_team(&e.team_details))?;
            writeln!(f, "location: {}", describe_location(&e.estimated_location))?;
            writeln!(f, "</event>")?;
        }
        write!(f, "</recent_events>")
    }
}

pub struct ContextAggregator {
    event_log: EventLog,
    log: Arc<dyn Log>,
}

impl ContextAggregator {
    pub fn new(event_log: EventLog, log: Arc<dyn Log>) -> Self {
        Self { event_log, log }
    }

    /// reference から window 遡った範囲の Event を集約する
    ///
    /// 読み込みに失敗したら空の集約を返す。壊れた行は飛ばして件数をログに残す。
    pub fn aggregate(
        &self,
        reference: DateTime<Utc>,
        window: Duration,
        limit: Option<usize>,
    ) -> AggregatedContext {
        let outcome = match self.event_log.read_all() {
            Ok(o) => o,
            Err(e) => {
                self.emit(
                    LogRecord::new(LogLevel::Error, "failed to read event log")
                        .with_field("path", self.event_log.path().display().to_string())
                        .with_field("error", e.to_string()),
                );
                return AggregatedContext::default();
            }
        };

        if outcome.skipped_lines > 0 {
            let mut record = LogRecord::new(LogLevel::Warn, "skipped malformed event log lines")
                .with_field("skipped", outcome.skipped_lines);
            if let Some((line, err)) = &outcome.first_error {
                record = record
                    .with_field("first_line", *line)
                    .with_field("first_error", err.as_str());
            }
            self.emit(record);
        }

        // 窓が暦の範囲を越えるときは最古の時刻から
        let start = reference
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut events: Vec<Event> = outcome
            .items
            .into_iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= reference && e.has_summary())
            .collect();
        // 安定ソート: 同時刻はログの順序を保つ
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            events.truncate(limit);
        }

        let context = AggregatedContext::from_sorted(reference, events);
        self.emit(
            LogRecord::new(LogLevel::Debug, "context aggregated")
                .with_field("count", context.count)
                .with_field("avg_score", context.avg_score),
        );
        context
    }

    fn emit(&self, record: LogRecord) {
        let _ = self
            .log
            .log(&record.with_layer("usecase").with_kind("aggregation"));
    }
}
