/// `AddWithCarry` vectors and properties.
pub mod arithmetic;
