pub mod bundles;

pub mod clock_snapshot;

pub mod preset;

pub mod side;

pub mod drawing_support {
    pub const MAX_STRINGABLE_SECS: u64 = 5999;
}
