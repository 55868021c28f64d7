//! Section-name resolution for settings types.
//!
//! A settings type binds to the configuration section named by its
//! [`Section::SECTION_NAME`] constant, or to its own simple type name when
//! the constant is unset or blank.

/// Settings type that can be bound to a configuration section.
///
/// ```
/// use settings_substitution::{section_name, Section};
///
/// struct Database;
/// impl Section for Database {
///     const SECTION_NAME: Option<&'static str> = Some("ConnectionStrings:Primary");
/// }
///
/// struct Logging;
/// impl Section for Logging {}
///
/// assert_eq!(section_name::<Database>(), "ConnectionStrings:Primary");
/// assert_eq!(section_name::<Logging>(), "Logging");
/// ```
pub trait Section {
    /// Explicit section name. Blank names fall back to the type name.
    const SECTION_NAME: Option<&'static str> = None;
}

/// Resolve the section a settings type binds to.
pub fn section_name<T: Section + ?Sized>() -> &'static str {
    match T::SECTION_NAME {
        Some(name) if !name.trim().is_empty() => name,
        _ => simple_type_name(std::any::type_name::<T>()),
    }
}

/// Strip the module path and generic arguments from a type path.
///
/// `my_app::settings::Cache<alloc::string::String>` becomes `Cache` and
/// `&mut a::B` becomes `B`. Tuples, slices and arrays have no simple name
/// and come back whole.
pub fn simple_type_name(type_path: &str) -> &str {
    let path = strip_references(type_path.trim());
    if path.starts_with(['(', '[']) {
        return path;
    }
    let base = match path.find('<') {
        Some(index) => &path[..index],
        None => path,
    };
    match base.rfind("::") {
        Some(index) => &base[index + 2..],
        None => base,
    }
}

/// `&'a mut dyn a::B` is `a::B`.
fn strip_references(mut path: &str) -> &str {
    while let Some(rest) = path.strip_prefix('&') {
        path = rest.trim_start();
        if let Some(rest) = path.strip_prefix('\'') {
            path = rest
                .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_')
                .trim_start();
        }
        if let Some(rest) = path.strip_prefix("mut ") {
            path = rest.trim_start();
        }
    }
    path.strip_prefix("dyn ").map_or(path, str::trim_start)
}
