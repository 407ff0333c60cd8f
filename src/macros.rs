macro_rules! string_id_wrapper {
    ($(#[$attr:meta])* $n:ident) => {
        $(#[$attr])*
        #[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $n(String);

        impl $n {
            pub fn new(v: impl Into<String>) -> Self {
                Self(v.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $n {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::std::fmt::Debug for $n {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($n), self.0)
            }
        }

        impl From<&str> for $n {
            fn from(v: &str) -> Self {
                Self::new(v)
            }
        }

        impl From<String> for $n {
            fn from(v: String) -> Self {
                Self(v)
            }
        }

        ::static_assertions::assert_impl_all!($n: Send, Sync);
    };
}
