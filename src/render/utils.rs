//! Utilidades pequeñas para subir texturas y leerlas de vuelta desde la GPU.

use anyhow::{bail, Result};

/// Las filas copiadas desde una textura deben empezar en un múltiplo de `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32, align: u32) -> u32 {
    let unpadded = width * bytes_per_pixel;
    unpadded.div_ceil(align) * align
}

/// Copia `height` filas de `row_len` bytes desde un buffer con filas separadas por `stride`.
pub fn strip_row_padding(src: &[u8], row_len: usize, stride: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(row_len * height);
    for row in 0..height {
        let start = row * stride;
        out.extend_from_slice(&src[start..start + row_len]);
    }
    out
}

/// Convierte píxeles BGRA a RGBA en el mismo buffer.
pub fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Falla si algún lado supera `max_texture_dimension_2d` del dispositivo.
pub fn check_texture_size(width: u32, height: u32, max_dim: u32) -> Result<()> {
    if width > max_dim || height > max_dim {
        bail!("{width}x{height} exceeds the GPU texture limit of {max_dim}");
    }
    Ok(())
}

pub fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_alignment() {
        assert_eq!(padded_bytes_per_row(64, 4, 256), 256);
        assert_eq!(padded_bytes_per_row(65, 4, 256), 512);
        assert_eq!(padded_bytes_per_row(1, 4, 256), 256);
    }

    #[test]
    fn padding_is_removed() {
        // two rows of 3 bytes with stride 4
        let src = [1, 2, 3, 0, 4, 5, 6, 0];
        assert_eq!(strip_row_padding(&src, 3, 4, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn bgra_becomes_rgba() {
        let mut px = [10, 20, 30, 255, 1, 2, 3, 4];
        swap_red_blue(&mut px);
        assert_eq!(px, [30, 20, 10, 255, 3, 2, 1, 4]);
    }

    #[test]
    fn sizes_above_the_device_limit_are_rejected() {
        // downlevel adapters only allow 2048
        assert!(check_texture_size(4096, 64, 2048).is_err());
        assert!(check_texture_size(64, 4096, 2048).is_err());
        assert!(check_texture_size(2048, 2048, 2048).is_ok());
    }
}
