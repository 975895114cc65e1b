//! Access predicate consulted before generating URLs for protected routes.

/// Decides whether the current caller may use a route.
///
/// The router only consumes the yes/no answer. Policy lives elsewhere.
///
/// Any `Fn(&[String]) -> bool` closure is an `AccessCheck`:
///
/// ```
/// use oxide_router::AccessCheck;
///
/// let admin_only = |needed: &[String]| needed.iter().all(|p| p == "admin");
/// assert!(admin_only.is_allowed(&["admin".to_string()]));
/// assert!(!admin_only.is_allowed(&["editor".to_string()]));
/// ```
pub trait AccessCheck: Send + Sync {
    /// Returns true if every permission in `access` is granted.
    fn is_allowed(&self, access: &[String]) -> bool;
}

impl<F> AccessCheck for F
where
    F: Fn(&[String]) -> bool + Send + Sync,
{
    fn is_allowed(&self, access: &[String]) -> bool {
        self(access)
    }
}

/// Grants a fixed set of permissions.
#[derive(Debug, Clone, Default)]
pub struct GrantedPermissions {
    granted: Vec<String>,
}

impl GrantedPermissions {
    /// Creates a check granting exactly `permissions`.
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

impl AccessCheck for GrantedPermissions {
    fn is_allowed(&self, access: &[String]) -> bool {
        access.iter().all(|p| self.granted.contains(p))
    }
}
