//! ポーリングループの共通部品
//!
//! 待機は短い区間に分けて行い、区間ごとに割り込みを確認する。実行中の呼び出しは中断しない。

use crate::ports::outbound::{InterruptChecker, Sleeper};
use std::time::Duration;

/// 1 回の sleep の最大長
pub const SLEEP_SLICE: Duration = Duration::from_secs(1);

/// サイクルが Err で終わったあとの待機
pub const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// total だけ待つ。途中で割り込まれたら false を返す。
pub fn sleep_interruptibly(
    sleeper: &dyn Sleeper,
    interrupt: &dyn InterruptChecker,
    total: Duration,
) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if interrupt.is_interrupted() {
            return false;
        }
        let step = remaining.min(SLEEP_SLICE);
        sleeper.sleep(step);
        remaining -= step;
    }
    !interrupt.is_interrupted()
}
