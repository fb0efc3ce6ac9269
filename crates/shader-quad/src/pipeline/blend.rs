//! Blend functions.

/// `RGBA = ADD(SRC_COLOR * SRC_ALPHA, DST_COLOR * (1 - SRC_ALPHA))`.
///
/// Applied to alpha as well as color; this is what every quad base pipeline uses.
pub fn standard_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// `RGBA = ADD(SRC_COLOR, DST_COLOR * (1 - SRC_ALPHA))`, the default for a fresh pipeline.
pub fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_blend_scales_source_by_its_alpha() {
        let b = standard_alpha_blend();
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(b.alpha, b.color);
        assert_ne!(b, premul_alpha_blend());
    }
}
