//! Texture samplers.

/// Addressing mode along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressMode {
    /// Clamp to the edge texel.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirror and repeat.
    MirrorRepeat,
}

impl From<AddressMode> for wgpu::AddressMode {
    fn from(mode: AddressMode) -> Self {
        match mode {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Bilinear.
    #[default]
    Linear,
}

impl From<FilterMode> for wgpu::FilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDescriptor {
    /// Addressing along U.
    pub address_mode_u: AddressMode,
    /// Addressing along V.
    pub address_mode_v: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
        }
    }
}

impl SamplerDescriptor {
    /// Linear filtering, repeating in both directions. Used for material maps.
    pub fn repeating() -> Self {
        Self {
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            ..Default::default()
        }
    }

    /// Panorama lookups: longitude wraps, latitude clamps at the poles.
    pub fn equirectangular() -> Self {
        Self {
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::ClampToEdge,
            ..Default::default()
        }
    }
}

/// A GPU sampler.
pub struct Sampler {
    sampler: wgpu::Sampler,
}

impl Sampler {
    /// Create a sampler from `desc`.
    pub fn new(device: &wgpu::Device, desc: &SamplerDescriptor, label: Option<&str>) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label,
            address_mode_u: desc.address_mode_u.into(),
            address_mode_v: desc.address_mode_v.into(),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: desc.mag_filter.into(),
            min_filter: desc.min_filter.into(),
            mipmap_filter: desc.mipmap_filter.into(),
            ..Default::default()
        });

        Self { sampler }
    }

    /// Repeating linear sampler.
    pub fn linear(device: &wgpu::Device) -> Self {
        Self::new(device, &SamplerDescriptor::repeating(), Some("Material Sampler"))
    }

    /// Sampler for equirectangular environment maps.
    pub fn equirectangular(device: &wgpu::Device) -> Self {
        Self::new(device, &SamplerDescriptor::equirectangular(), Some("Environment Sampler"))
    }

    /// Clamped linear sampler for full-screen passes.
    pub fn clamped(device: &wgpu::Device) -> Self {
        Self::new(device, &SamplerDescriptor::default(), Some("Clamped Sampler"))
    }

    /// Underlying wgpu sampler.
    #[inline]
    pub fn wgpu_sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
