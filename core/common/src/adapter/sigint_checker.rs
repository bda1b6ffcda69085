//! 終了シグナルを監視ループの停止要求に変える InterruptChecker 実装
//!
//! ctrlc の `termination` 機能により SIGINT に加えて SIGTERM / SIGHUP も同じハンドラに届く。
//! ハンドラはフラグを立てるだけで、進行中のキャプチャやモデル呼び出しは中断しない。
//! ループはサイクルの境目と sleep の 1 秒刻みごとにフラグを見て抜ける。

use crate::ports::outbound::InterruptChecker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 終了シグナルを受けたら停止扱いになる
pub struct SigintChecker {
    stop_requested: Arc<AtomicBool>,
}

impl SigintChecker {
    /// ハンドラを登録する。ctrlc はプロセスに 1 つしか登録できないので、
    /// 2 回目以降は Err（wiring 側で NoopInterruptChecker に落とす）。
    pub fn new() -> Result<Self, ctrlc::Error> {
        let checker = Self::from_flag(Arc::new(AtomicBool::new(false)));
        let flag = Arc::clone(&checker.stop_requested);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
        Ok(checker)
    }

    fn from_flag(stop_requested: Arc<AtomicBool>) -> Self {
        Self { stop_requested }
    }
}

impl InterruptChecker for SigintChecker {
    fn is_interrupted(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

/// 停止要求を出さない実装（ハンドラ登録に失敗したとき・テスト）
#[derive(Debug, Clone, Default)]
pub struct NoopInterruptChecker;

impl NoopInterruptChecker {
    pub fn new() -> Self {
        Self
    }
}

impl InterruptChecker for NoopInterruptChecker {
    fn is_interrupted(&self) -> bool {
        false
    }
}
