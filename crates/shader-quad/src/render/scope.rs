/// Runs `f` inside a validation error scope and returns what the scope caught.
///
/// Validation errors raised outside a scope go to wgpu's uncaptured-error
/// handler, which panics by default.
pub(super) fn capture_validation<R>(
    device: &wgpu::Device,
    f: impl FnOnce() -> R,
) -> (R, Option<wgpu::Error>) {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let out = f();
    // Native backends resolve the pop immediately.
    let error = pollster::block_on(scope.pop());
    (out, error)
}
