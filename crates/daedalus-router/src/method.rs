//! HTTP method sets and per-path method dispatch.

use std::fmt;

use http::Method;
use smallvec::SmallVec;

/// The methods a route answers to.
///
/// # Example
///
/// ```rust
/// use daedalus_router::MethodSet;
/// use http::Method;
///
/// let set = MethodSet::from([Method::GET, Method::POST]);
/// assert!(set.contains(&Method::POST));
/// assert!(!set.contains(&Method::DELETE));
/// assert!(MethodSet::Any.contains(&Method::DELETE));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    /// Every method.
    Any,
    /// An explicit list of methods.
    Only(SmallVec<[Method; 2]>),
}

impl MethodSet {
    /// Returns `true` if the set includes `method`.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(methods) => methods.contains(method),
        }
    }

    /// Returns the explicit methods, or an empty slice for [`MethodSet::Any`].
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        match self {
            Self::Any => &[],
            Self::Only(methods) => methods,
        }
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        let mut methods = SmallVec::new();
        methods.push(method);
        Self::Only(methods)
    }
}

impl<const N: usize> From<[Method; N]> for MethodSet {
    fn from(methods: [Method; N]) -> Self {
        methods.into_iter().collect()
    }
}

impl From<Vec<Method>> for MethodSet {
    fn from(methods: Vec<Method>) -> Self {
        methods.into_iter().collect()
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        let mut methods: SmallVec<[Method; 2]> = SmallVec::new();
        for method in iter {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Self::Only(methods)
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(methods) => {
                let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

/// Maps methods to route values for a single concrete path.
///
/// Explicit methods take priority over an any-method registration. A `HEAD`
/// request falls back to the `GET` entry when no `HEAD` entry exists.
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); 4]>,
    any: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
            any: None,
        }
    }
}

impl<T: Clone> MethodRouter<T> {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for every method in `methods`.
    ///
    /// Nothing is inserted if any method is already taken; the error carries
    /// the conflicting method (`None` for an any-method conflict).
    pub fn insert(&mut self, methods: &MethodSet, value: T) -> Result<(), Option<Method>> {
        match methods {
            MethodSet::Any => {
                if self.any.is_some() {
                    return Err(None);
                }
                self.any = Some(value);
            }
            MethodSet::Only(list) => {
                if let Some(taken) = list.iter().find(|m| self.exact(m).is_some()) {
                    return Err(Some(taken.clone()));
                }
                for method in list {
                    self.entries.push((method.clone(), value.clone()));
                }
            }
        }
        Ok(())
    }

    fn exact(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Returns the value registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.exact(method)
            .or_else(|| {
                if *method == Method::HEAD {
                    self.exact(&Method::GET)
                } else {
                    None
                }
            })
            .or(self.any.as_ref())
    }

    /// Returns the explicitly registered methods, in registration order.
    #[must_use]
    pub fn allowed(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Renders the `Allow` header value for a 405 response.
    #[must_use]
    pub fn allow_header(&self) -> String {
        let mut names: Vec<&str> = self.entries.iter().map(|(m, _)| m.as_str()).collect();
        if self.exact(&Method::GET).is_some() && self.exact(&Method::HEAD).is_none() {
            names.push(Method::HEAD.as_str());
        }
        names.join(", ")
    }
}
