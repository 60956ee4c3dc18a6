pub mod bmp;
pub mod external;
