/// A rectangular block of pixels cut out of a frame, plus an optional
/// per-pixel coverage mask used when it is composited back.
///
/// `mask` holds one byte per pixel: 255 replaces the frame pixel, 0 keeps it,
/// anything in between blends. `None` means fully opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    mask: Option<Vec<u8>>,
}

impl Patch {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize)
        );
        Self {
            data,
            width,
            height,
            channels,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: Vec<u8>) -> Self {
        debug_assert_eq!(mask.len(), self.pixel_count());
        self.mask = Some(mask);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn mask(&self) -> Option<&[u8]> {
        self.mask.as_deref()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether this patch can stand in for a `width` x `height` area of a
    /// `channels`-channel frame.
    pub fn matches(&self, width: u32, height: u32, channels: u8) -> bool {
        self.width == width
            && self.height == height
            && self.channels == channels
            && self.data.len() == self.pixel_count() * channels as usize
            && self.mask.as_ref().map_or(true, |m| m.len() == self.pixel_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_checks_shape_and_mask() {
        let p = Patch::new(vec![0; 2 * 3 * 3], 2, 3, 3);
        assert!(p.matches(2, 3, 3));
        assert!(!p.matches(3, 2, 3));
        assert!(!p.matches(2, 3, 4));
        assert!(p.with_mask(vec![255; 6]).matches(2, 3, 3));
    }

    #[test]
    fn test_unmasked_by_default() {
        let p = Patch::new(vec![1, 2, 3], 1, 1, 3);
        assert!(p.mask().is_none());
        assert_eq!(p.pixel_count(), 1);
    }
}
