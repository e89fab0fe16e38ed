//! Content sniffing: MIME type and extension detection from magic bytes
//!
//! Classification is based on payload bytes, never on the file name.

/// A sniffed content classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SniffedType {
    pub mime: &'static str,
    pub extension: &'static str,
}

impl SniffedType {
    const fn new(mime: &'static str, extension: &'static str) -> Self {
        SniffedType { mime, extension }
    }

    /// True iff the top-level MIME type is `image`.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Detect the MIME type and canonical extension from magic bytes.
/// Returns `None` when the payload matches no known signature.
pub fn sniff(data: &[u8]) -> Option<SniffedType> {
    if data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(SniffedType::new("image/jpeg", "jpg"));
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some(SniffedType::new("image/png", "png"));
    }

    // GIF: "GIF8"
    if data.starts_with(b"GIF8") {
        return Some(SniffedType::new("image/gif", "gif"));
    }

    // RIFF containers: WebP and WAV
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        if &data[8..12] == b"WEBP" {
            return Some(SniffedType::new("image/webp", "webp"));
        }
        if &data[8..12] == b"WAVE" {
            return Some(SniffedType::new("audio/wav", "wav"));
        }
    }

    // BMP: "BM"
    if data.starts_with(b"BM") {
        return Some(SniffedType::new("image/bmp", "bmp"));
    }

    // TIFF: "II*\0" (little endian) or "MM\0*" (big endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Some(SniffedType::new("image/tiff", "tiff"));
    }

    // ISO-BMFF containers: "ftyp" at offset 4 (AVIF, HEIC, MP4)
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        if brand == b"avif" || brand == b"avis" {
            return Some(SniffedType::new("image/avif", "avif"));
        }
        if brand == b"heic" || brand == b"heix" {
            return Some(SniffedType::new("image/heic", "heic"));
        }
        return Some(SniffedType::new("video/mp4", "mp4"));
    }

    // PDF: "%PDF"
    if data.starts_with(b"%PDF") {
        return Some(SniffedType::new("application/pdf", "pdf"));
    }

    // ZIP: "PK\x03\x04"
    if data.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        return Some(SniffedType::new("application/zip", "zip"));
    }

    // GZIP: 1F 8B
    if data.starts_with(&[0x1F, 0x8B]) {
        return Some(SniffedType::new("application/gzip", "gz"));
    }

    // MP3: ID3 tag or MPEG frame sync
    if data.starts_with(b"ID3") || (data[0] == 0xFF && (data[1] & 0xE0) == 0xE0) {
        return Some(SniffedType::new("audio/mpeg", "mp3"));
    }

    // OGG: "OggS"
    if data.starts_with(b"OggS") {
        return Some(SniffedType::new("audio/ogg", "ogg"));
    }

    None
}

/// True iff the payload sniffs as a raster image.
pub fn is_image(data: &[u8]) -> bool {
    sniff(data).is_some_and(|t| t.is_image())
}
