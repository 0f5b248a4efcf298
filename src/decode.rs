//! AVIF decoding for the re-compression and enhancement paths.
//!
//! The `image` crate's `avif` feature is encoder-only (rav1e); its decoder
//! feature pulls in the C library dav1d. Decoding here instead goes through
//! `avif-parse` for the container and `rav1d` (the pure Rust dav1d port) for
//! the AV1 payload, with a BT.601 YUV to RGB conversion at the end.

use crate::error::{ConvertError, Result};
use image::DynamicImage;
use std::path::Path;

use rav1d::include::dav1d::data::Dav1dData;
use rav1d::include::dav1d::dav1d::Dav1dSettings;
use rav1d::include::dav1d::headers::{
    DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
    DAV1D_PIXEL_LAYOUT_I444,
};
use rav1d::include::dav1d::picture::Dav1dPicture;
use std::ptr::NonNull;

fn decode_error(msg: impl Into<String>) -> ConvertError {
    ConvertError::AvifDecode(msg.into())
}

/// Decodes the primary item of an AVIF file into an RGB8 image.
pub fn decode_avif(path: &Path) -> Result<DynamicImage> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data))
        .map_err(|e| decode_error(format!("container parse failed: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe {
        rav1d::src::lib::dav1d_default_settings(NonNull::new(settings.as_mut_ptr()).unwrap())
    };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(decode_error(format!("decoder open failed ({})", rc.0)));
    }

    // Copy the AV1 payload into a decoder-owned buffer
    let mut data = Dav1dData::default();
    let buf_ptr =
        unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(decode_error("payload buffer allocation failed"));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data));
            rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(decode_error(format!("send_data failed ({})", rc.0)));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(decode_error(format!("get_picture failed ({})", rc.0)));
    }

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let bpc = pic.p.bpc as u32;
    let layout = pic.p.layout;
    let y_stride = pic.stride[0];
    let uv_stride = pic.stride[1];
    let y_ptr = pic.data[0].unwrap().as_ptr() as *const u8;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        Ok(YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride,
            uv_stride: 0,
            width,
            height,
            bpc,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        })
    } else {
        let subsampling = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => Some((true, true)),
            DAV1D_PIXEL_LAYOUT_I422 => Some((true, false)),
            DAV1D_PIXEL_LAYOUT_I444 => Some((false, false)),
            _ => None,
        };
        match subsampling {
            Some((ss_x, ss_y)) => Ok(YuvPlanes {
                y_ptr,
                u_ptr: pic.data[1].unwrap().as_ptr() as *const u8,
                v_ptr: pic.data[2].unwrap().as_ptr() as *const u8,
                y_stride,
                uv_stride,
                width,
                height,
                bpc,
                ss_x,
                ss_y,
                monochrome: false,
            }),
            None => Err(decode_error(format!("unsupported pixel layout: {layout}"))),
        }
    };

    let rgb = planes.map(|p| p.to_rgb());

    unsafe {
        rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
        rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
    }

    image::RgbImage::from_raw(width, height, rgb?)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| decode_error("decoded plane size mismatch"))
}

/// Borrowed YUV plane pointers from a decoded picture.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling, horizontal and vertical (I420 = both)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// Interleaved RGB8 via BT.601 coefficients, scaled down from the
    /// source bit depth.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = vec![0u8; (self.width * self.height * 3) as usize];

        for row in 0..self.height {
            for col in 0..self.width {
                let y_val = read_plane(self.y_ptr, self.y_stride, col, row, self.bpc);

                let (r, g, b) = if self.monochrome {
                    let v = (y_val * scale).clamp(0.0, 255.0);
                    (v, v, v)
                } else {
                    let u_col = if self.ss_x { col / 2 } else { col };
                    let u_row = if self.ss_y { row / 2 } else { row };
                    let cb = read_plane(self.u_ptr, self.uv_stride, u_col, u_row, self.bpc) - center;
                    let cr = read_plane(self.v_ptr, self.uv_stride, u_col, u_row, self.bpc) - center;

                    (
                        ((y_val + 1.402 * cr) * scale).clamp(0.0, 255.0),
                        ((y_val - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0),
                        ((y_val + 1.772 * cb) * scale).clamp(0.0, 255.0),
                    )
                };

                let idx = ((row * self.width + col) * 3) as usize;
                rgb[idx] = r as u8;
                rgb[idx + 1] = g as u8;
                rgb[idx + 2] = b as u8;
            }
        }

        rgb
    }
}

/// Reads one sample from a plane, 8-bit or 16-bit storage depending on bpc.
#[inline]
fn read_plane(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { *(ptr.offset(byte_offset) as *const u16) }) as f32
    }
}
