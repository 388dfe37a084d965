//! `define_port_error!`: declares a port error enum with one snake_case
//! constructor per variant.
//!
//! Every variant carries named fields and a display template. Constructor
//! arguments accept anything convertible into the field type, so adapters can
//! pass `&str` or an owned `String` alike:
//!
//! ```ignore
//! define_port_error! {
//!     pub enum StoreError {
//!         Offline { message: String } => "store offline: {message}",
//!     }
//! }
//! let err = StoreError::offline("connection refused");
//! ```

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),+ $(,)? } => $message:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field: $ty),+ },
            )+
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = "Build the `" $variant "` variant."]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                        Self::$variant { $($field: $field.into()),+ }
                    }
                }
            )+
        }
    };
}

pub(crate) use define_port_error;
