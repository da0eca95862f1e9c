#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Administrator = 1,
    Employee = 2,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Administrator),
            2 => Some(Role::Employee),
            _ => None,
        }
    }
}
