use super::traits::ImageView;

#[derive(Clone, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Square window of side `2 * radius + 1` centred on `(cx, cy)`, row-major,
    /// as floats. `None` if any part of the window leaves the image.
    pub fn window(&self, cx: i64, cy: i64, radius: usize) -> Option<Vec<f64>> {
        let r = radius as i64;
        if cx - r < 0 || cy - r < 0 || cx + r >= self.w as i64 || cy + r >= self.h as i64 {
            return None;
        }
        let side = 2 * radius + 1;
        let mut out = Vec::with_capacity(side * side);
        for y in (cy - r)..=(cy + r) {
            let row = self.row(y as usize);
            out.extend(
                row[(cx - r) as usize..=(cx + r) as usize]
                    .iter()
                    .map(|&v| f64::from(v)),
            );
        }
        Some(out)
    }
}

impl<'a> ImageView for ImageU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}
