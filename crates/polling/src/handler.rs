use async_trait::async_trait;

/// Application logic invoked once per update.
#[async_trait]
pub trait UpdateHandler<U: Send + 'static>: Send + Sync {
    async fn process(&self, update: U) -> anyhow::Result<()>;
}

/// Builds a fresh handler for every dispatched update, so no handler state
/// carries over from one update to the next.
///
/// Any `Fn() -> H` closure is a factory.
pub trait HandlerFactory<U: Send + 'static>: Send + Sync + 'static {
    fn create(&self) -> Box<dyn UpdateHandler<U>>;
}

impl<U, H, F> HandlerFactory<U> for F
where
    U: Send + 'static,
    H: UpdateHandler<U> + 'static,
    F: Fn() -> H + Send + Sync + 'static,
{
    fn create(&self) -> Box<dyn UpdateHandler<U>> {
        Box::new(self())
    }
}
