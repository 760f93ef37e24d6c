/// Declares a fieldless enum whose variants map one-to-one onto wire bytes,
/// along with `from_u8` and `as_u8` conversions.
#[macro_export]
macro_rules! c_like_enum {
    ( $(#[$attr: meta])* $name: ident { $($(#[$vattr: meta])* $variant: ident = $value: literal,)* } ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vattr])* $variant = $value,)+
        }

        impl $name {
            pub fn from_u8(value: u8) -> Option<$name> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None
                }
            }

            pub fn as_u8(self) -> u8 {
                self as u8
            }
        }
    };
}
