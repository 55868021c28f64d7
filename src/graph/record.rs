//! Descriptor macro for settings records.

/// Implement [`Node`](crate::graph::Node) and [`RecordNode`](crate::graph::RecordNode)
/// for a settings struct by listing its fields.
///
/// Each field may carry an access level after a colon:
/// - no suffix or `public` - strings are substituted, composites visited
/// - `restricted` - strings are left alone, composites still visited
/// - `readonly` - never visited
///
/// Fields that are not listed are never visited either. The macro has to be
/// invoked where the listed fields are visible, normally next to the struct.
///
/// Generic structs take an `impl<...>` prefix naming their type parameters,
/// with an optional `where` clause. Each parameter or `where` entry takes a
/// single trait bound, and lifetime parameters are not accepted:
///
/// ```
/// use settings_substitution::{configure_record, Node};
///
/// struct Tagged<T> {
///     value: T,
///     tag: String,
/// }
///
/// configure_record!(impl<T> Tagged<T> where T: Node { value, tag: readonly });
/// ```
///
/// ```
/// use settings_substitution::{configure_record, from_fn, Configurator};
///
/// #[derive(Default)]
/// struct Database {
///     url: String,
///     user: Option<String>,
///     pool_size: u32,
///     token: String,
/// }
///
/// configure_record!(Database { url, user, pool_size, token: restricted });
///
/// let mut db = Database {
///     url: "pg://$HOST".into(),
///     token: "$TOKEN".into(),
///     ..Default::default()
/// };
/// let configurator = Configurator::new(from_fn(|v: &str| v.replace("$HOST", "db")));
/// configurator.configure(&mut db).unwrap();
///
/// assert_eq!(db.url, "pg://db");
/// assert_eq!(db.token, "$TOKEN");
/// assert!(db.user.is_none());
/// ```
#[macro_export]
macro_rules! configure_record {
    (@access) => {
        $crate::graph::Access::Public
    };
    (@access public) => {
        $crate::graph::Access::Public
    };
    (@access restricted) => {
        $crate::graph::Access::Restricted
    };
    (@access readonly) => {
        $crate::graph::Access::ReadOnly
    };
    (@record [$($generics:tt)*] $ty:ty [$($bounds:tt)*] {
        $( $field:ident $(: $access:ident)? ),* $(,)?
    }) => {
        impl<$($generics)*> $crate::graph::RecordNode for $ty $($bounds)* {
            fn type_name(&self) -> &'static str {
                $crate::section::simple_type_name(::std::any::type_name::<Self>())
            }

            #[allow(unused_variables)]
            fn visit_fields(
                &mut self,
                visitor: &mut $crate::graph::Visitor<'_>,
            ) -> ::std::result::Result<(), $crate::ConfigureError> {
                $(
                    visitor.field(
                        stringify!($field),
                        $crate::configure_record!(@access $($access)?),
                        &mut self.$field,
                    )?;
                )*
                Ok(())
            }
        }

        impl<$($generics)*> $crate::graph::Node for $ty $($bounds)* {
            fn as_node_mut(&mut self) -> $crate::graph::NodeMut<'_> {
                $crate::graph::NodeMut::Record(self)
            }
        }
    };
    (impl<$($param:ident $(: $bound:path)?),+ $(,)?> $ty:ty
        $(where $($bounded:ty : $where_bound:path),+ $(,)?)?
        { $($fields:tt)* }
    ) => {
        $crate::configure_record!(
            @record [$($param $(: $bound)?),+] $ty [$(where $($bounded: $where_bound),+)?] { $($fields)* }
        );
    };
    ($ty:ty { $($fields:tt)* }) => {
        $crate::configure_record!(@record [] $ty [] { $($fields)* });
    };
}
