pub mod chip_id;
pub mod dtc;
pub mod file;
pub mod pack;
pub mod qcdt;

/// Compile-time assertion.
#[macro_export]
macro_rules! static_assert {
    ($condition:expr) => {
        const _: () = core::assert!($condition);
    };
}
