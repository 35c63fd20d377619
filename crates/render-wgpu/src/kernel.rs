use crate::shaders;

/// A compute kernel as the GPU backend consumes it: WGSL source and the
/// entry point to dispatch. The source must declare the shared binding
/// contract (parameters, objects, output image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderKernel {
    label: &'static str,
    source: String,
    entry_point: &'static str,
}

impl ShaderKernel {
    pub fn new(label: &'static str, source: impl Into<String>, entry_point: &'static str) -> Self {
        Self {
            label,
            source: source.into(),
            entry_point,
        }
    }

    /// The lensing ray marcher.
    pub fn geodesic() -> Self {
        Self::new("geodesic", shaders::geodesic_source(), "main")
    }

    /// Gradient and checkerboard stub.
    pub fn pattern() -> Self {
        Self::new("pattern", shaders::pattern_source(), "main")
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &'static str {
        self.entry_point
    }
}

impl Default for ShaderKernel {
    fn default() -> Self {
        Self::geodesic()
    }
}
