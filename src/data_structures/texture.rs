//! GPU texture wrapper and creation helpers.

use anyhow::*;
use image::{GenericImageView, ImageFormat, load_from_memory_with_format};

/// A GPU texture together with its view and sampler.
///
/// Used for colour maps, normal maps and the depth attachment. Created from
/// image bytes via [`from_bytes`](Self::from_bytes) or procedurally via the
/// `create_*` constructors.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create the depth attachment used by the main render pass.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let texture = create_texture_2d(
            device,
            size[0].max(1),
            size[1].max(1),
            Self::DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            label,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 single-colour texture.
    ///
    /// Covers two fallbacks: the neutral normal map for materials without
    /// one, and a flat base colour for materials without a diffuse texture.
    /// Keeping a texture bound either way avoids a second pipeline variant.
    pub fn single_pixel(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        is_normal_map: bool,
        label: &str,
    ) -> Self {
        let texture = create_texture_2d(
            device,
            1,
            1,
            colour_format(is_normal_map),
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label,
        );
        write_rgba(queue, &texture, 1, 1, &rgba);
        Self::wrap(device, texture)
    }

    /// The flat "no deformation" normal map.
    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::single_pixel(device, queue, [127, 127, 255, 255], true, "default normal map")
    }

    /// Load a texture from raw image file bytes (PNG, JPEG, ...).
    ///
    /// `format` is an optional extension hint ("png", "jpg"); without it the
    /// format is sniffed. `is_normal_map` selects linear instead of sRGB
    /// storage.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        };
        Self::from_image(device, queue, &img, Some(label), is_normal_map)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        let texture = create_texture_2d(
            device,
            width,
            height,
            colour_format(is_normal_map),
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label.unwrap_or("texture"),
        );
        write_rgba(queue, &texture, width, height, &rgba);

        Ok(Self::wrap(device, texture))
    }

    fn wrap(device: &wgpu::Device, texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Normal maps store vectors, not colours, and must stay linear.
fn colour_format(is_normal_map: bool) -> wgpu::TextureFormat {
    if is_normal_map {
        wgpu::TextureFormat::Rgba8Unorm
    } else {
        wgpu::TextureFormat::Rgba8UnormSrgb
    }
}

fn create_texture_2d(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    label: &str,
) -> wgpu::Texture {
    let view_formats: &[wgpu::TextureFormat] = if format == Texture::DEPTH_FORMAT {
        &[Texture::DEPTH_FORMAT]
    } else {
        &[]
    };
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats,
    })
}

fn write_rgba(queue: &wgpu::Queue, texture: &wgpu::Texture, width: u32, height: u32, data: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}
