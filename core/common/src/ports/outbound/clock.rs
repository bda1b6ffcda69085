//! 時刻とスリープの Outbound ポート
//!
//! usecase はこの trait 経由で「現在時刻」と「待機」を行う。テストでは固定時刻と
//! 待たないスリーパーを注入する。

use chrono::{DateTime, Utc};
use std::time::Duration;

/// 時刻取得の抽象
///
/// 実装は `common::adapter::StdClock` やテスト用の `FixedClock`。
pub trait Clock: Send + Sync {
    /// 現在時刻（UTC）
    fn now(&self) -> DateTime<Utc>;
}

/// 待機の抽象
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}
