use fatura_auth::{PrincipalId, Role};

/// Authenticated actor for a request.
///
/// This is immutable and must be present for all engine routes; the engine
/// itself never authenticates (the identity decision is upstream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl ActorContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self {
            principal_id,
            roles,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}
