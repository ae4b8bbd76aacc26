use crate::engine::EngineError;
use crate::models::Role;

/// The acting user for one engine invocation.
///
/// Every permission-gated operation takes this explicitly; nothing in
/// the engine reads a process-wide session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub role: Role,
}

impl RequestContext {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Fails with [`EngineError::PermissionDenied`] unless the caller
    /// holds at least `required`.
    pub fn require(&self, required: Role, action: &'static str) -> Result<(), EngineError> {
        if self.role < required {
            return Err(EngineError::PermissionDenied {
                action,
                required,
                actual: self.role,
                user_id: self.user_id,
            });
        }
        Ok(())
    }
}
