//! Typed parsing of parameter values.

/// A type a parameter value can be read as. Parsing happens on every
/// access; nothing is cached.
pub trait FromParam: Sized {
    /// Name used in parse errors.
    const EXPECTED: &'static str;

    /// Parse an already-trimmed value.
    fn from_param(value: &str) -> Option<Self>;
}

macro_rules! from_param_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromParam for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_param(value: &str) -> Option<Self> {
                    value.parse().ok()
                }
            }
        )*
    };
}

from_param_via_parse!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// `true` or `false`, ignoring case. Anything else is rejected.
impl FromParam for bool {
    const EXPECTED: &'static str = "bool";

    fn from_param(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl FromParam for String {
    const EXPECTED: &'static str = "string";

    fn from_param(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}
