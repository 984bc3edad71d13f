/// Host callback polled during long scans.
pub trait ProgressHook {
    /// `fraction` runs from 0.0 to 1.0. Returning `true` asks the engine to
    /// stop the current scan.
    fn report_progress(&mut self, fraction: f32) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressHook for NoProgress {
    fn report_progress(&mut self, _fraction: f32) -> bool {
        false
    }
}

impl<F> ProgressHook for F
where
    F: FnMut(f32) -> bool,
{
    fn report_progress(&mut self, fraction: f32) -> bool {
        self(fraction)
    }
}
