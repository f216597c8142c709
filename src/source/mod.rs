// source/mod.rs — 图片源模块入口
// 定义了所有图片源（本地文件、Unsplash）必须实现的通用 Trait

pub mod file;
pub mod unsplash;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait; // 异步 Trait 支持宏
use tokio::task::JoinHandle;

use crate::error::SourceError;
use crate::record::ImageRecord;

/// 图片源的抽象 Trait
/// 调用方在配置阶段选定一个实现，之后只通过这个接口取记录
///
/// # 异步 Trait 说明
/// 本地源是同步计算，远程源需要一次网络请求，
/// 统一成 async 接口后两者可以放进同一个 `Box<dyn ImageSource>`。
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// 来源名称（如 "file"、"unsplash"），用于日志
    fn name(&self) -> &'static str;

    /// 生成一条新的图片元数据记录
    async fn image_record(&self) -> Result<ImageRecord, SourceError>;
}

/// 取消标记与结果投递之间的同步点
///
/// 任务在锁内检查标记并完成投递（调用回调或返回结果），
/// `abort()` 在同一把锁内设置标记。因此回调要么在 `abort()` 返回前
/// 完整执行完毕，要么根本不执行，与运行时是否多线程无关。
#[derive(Debug, Clone, Default)]
pub(crate) struct DeliveryGate {
    cancelled: Arc<Mutex<bool>>,
}

impl DeliveryGate {
    /// 未取消时在锁内执行 `deliver`；已取消则返回 `SourceError::Cancelled`
    ///
    /// `deliver` 执行期间持有锁，其中不能再调用同一句柄的 `abort()`。
    pub(crate) fn deliver<R>(&self, deliver: impl FnOnce() -> R) -> Result<R, SourceError> {
        let cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        if *cancelled {
            return Err(SourceError::Cancelled);
        }
        Ok(deliver())
    }

    fn cancel(&self) {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}

/// 正在进行中的一次获取
///
/// 本身是一个 Future，`.await` 得到结果或错误；
/// 也可以随时调用 `abort()` 取消。完成之后再取消不会有任何效果。
#[derive(Debug)]
pub struct FetchHandle<T> {
    task: JoinHandle<Result<T, SourceError>>,
    gate: DeliveryGate,
}

impl<T: Send + 'static> FetchHandle<T> {
    /// 在当前 tokio 运行时上启动任务并立即返回句柄
    ///
    /// `make` 拿到投递闸门，任务必须通过 `DeliveryGate::deliver` 交付结果。
    pub(crate) fn spawn<M, F>(make: M) -> Self
    where
        M: FnOnce(DeliveryGate) -> F,
        F: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        let gate = DeliveryGate::default();
        Self {
            task: tokio::spawn(make(gate.clone())),
            gate,
        }
    }
}

impl<T> FetchHandle<T> {
    /// 取消请求；完成前取消可以保证成功分支（包括回调）不会执行
    pub fn abort(&self) {
        self.gate.cancel();
        self.task.abort();
    }

    /// 任务是否已经结束（成功、失败或被取消）
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for FetchHandle<T> {
    type Output = Result<T, SourceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SourceError::Cancelled),
            Err(e) => Err(SourceError::Task(e)),
        })
    }
}
