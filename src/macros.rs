/// Declare a closed, wire-stable enumeration stored as a `u16`.
///
/// The generated enum implements [`Scalar`][crate::scalar::Scalar] and
/// [`Follow`][crate::table::Follow], so it can be used directly as a table field or a vector
/// element. `default` is the schema default (what an absent field reads as), `unknown` is what
/// an ordinal this build doesn't recognize reads as.
///
/// Ordinals are part of the wire format: new variants may only ever be appended.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident (default = $default:ident, unknown = $unknown:ident) {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[repr(u16)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Every variant, in ordinal order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Look up a variant by its wire ordinal. Returns `None` if the ordinal isn't
            /// recognized.
            pub fn from_u16(v: u16) -> Option<Self> {
                match v {
                    $( x if x == $value => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// The wire ordinal.
            pub fn to_u16(self) -> u16 {
                self as u16
            }

            /// Read a wire ordinal, falling back on the designated variant for unknown values.
            pub fn from_wire(v: u16) -> Self {
                Self::from_u16(v).unwrap_or($name::$unknown)
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$name> for u16 {
            fn from(val: $name) -> u16 {
                val.to_u16()
            }
        }

        impl $crate::scalar::Scalar for $name {
            const SIZE: usize = 2;
            fn write_le(self, dst: &mut [u8]) {
                <byteorder::LittleEndian as byteorder::ByteOrder>::write_u16(dst, self as u16)
            }
            fn read_le(src: &[u8]) -> Self {
                Self::from_wire(<byteorder::LittleEndian as byteorder::ByteOrder>::read_u16(src))
            }
        }

        impl<'a> $crate::table::Follow<'a> for $name {
            type Inner = $name;
            fn follow(buf: &'a [u8], loc: usize) -> $name {
                <$name as $crate::scalar::Scalar>::read_le($crate::table::bytes_at(buf, loc, 2))
            }
        }

        impl<'a> $crate::table::Inline<'a> for $name {
            const SIZE: usize = 2;
        }
    };
}

/// Hook a zero-copy view type (a newtype over [`Table`][crate::table::Table]) into the reader
/// traits.
macro_rules! table_view {
    ($view:ident) => {
        impl<'a> From<$crate::table::Table<'a>> for $view<'a> {
            fn from(table: $crate::table::Table<'a>) -> Self {
                $view { table }
            }
        }

        impl<'a> $crate::table::Follow<'a> for $view<'a> {
            type Inner = $view<'a>;
            fn follow(buf: &'a [u8], loc: usize) -> $view<'a> {
                $view {
                    table: $crate::table::Table::new(buf, loc),
                }
            }
        }

        impl<'a> $view<'a> {
            /// The untyped table backing this view.
            pub fn table(&self) -> $crate::table::Table<'a> {
                self.table
            }
        }
    };
}
