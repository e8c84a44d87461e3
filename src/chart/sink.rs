use crate::error::Result;
use crate::series::Column;

/// Opaque handle to a chart created by a `RenderSink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

/// Chart-rendering collaborator.
///
/// `generate` builds a chart from an initial column set; `load` replaces the
/// data of an existing chart with a full column set. Callers never inspect
/// what the sink produced.
pub trait RenderSink {
    fn generate(&mut self, columns: &[Column]) -> Result<ChartHandle>;
    fn load(&mut self, handle: ChartHandle, columns: &[Column]) -> Result<()>;
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn generate(&mut self, columns: &[Column]) -> Result<ChartHandle> {
        (**self).generate(columns)
    }

    fn load(&mut self, handle: ChartHandle, columns: &[Column]) -> Result<()> {
        (**self).load(handle, columns)
    }
}
