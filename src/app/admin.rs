use crate::app::*;

/// Guards the administrative commands behind the shared password.
pub struct AdminGate<'a> {
    expected: &'a str,
}

impl<'a> AdminGate<'a> {
    pub fn new(expected: &'a str) -> AdminGate<'a> {
        AdminGate { expected }
    }

    pub fn authorize(&self, given: Option<&str>) -> AppResult<()> {
        match given {
            Some(p) if p == self.expected => {
                debug!("authorize: admin access granted");
                Ok(())
            }
            Some(_) => {
                warn!("authorize: wrong admin password");
                AdminDeniedSnafu {
                    reason: "wrong password",
                }
                .fail()
            }
            None => AdminDeniedSnafu {
                reason: "no password given (use --password or FEELMETER_ADMIN_PASSWORD)",
            }
            .fail(),
        }
    }
}
