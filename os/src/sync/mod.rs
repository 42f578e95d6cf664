mod up;

pub use up::{UPIntrFreeCell, UPIntrRefMut, UPSafeCellRaw};
