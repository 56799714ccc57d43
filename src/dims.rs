pub struct Rows(pub u32);
pub struct Cols(pub u32);
pub struct Dims(pub Rows, pub Cols);

impl From<(u32, u32)> for Dims {
    fn from((r, c): (u32, u32)) -> Self {
        Dims(Rows(r), Cols(c))
    }
}

impl Dims {
    /// Number of cells covered by these dimensions.
    pub fn count(&self) -> usize {
        let Dims(Rows(r), Cols(c)) = self;
        *r as usize * *c as usize
    }
}

pub trait HasDims {
    fn rows(&self) -> u32;
    fn cols(&self) -> u32;
    fn dims(&self) -> Dims {
        (self.rows(), self.cols()).into()
    }
}
