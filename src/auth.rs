//! Stub login gate. The credential pair is a literal placeholder; there is no
//! hashing, lockout or token, and the flag lives only as long as the process.

const LOGIN: &str = "22";
const PASSWORD: &str = "22";

#[derive(Debug, Default)]
pub struct Session {
    logged_in: bool,
}

impl Session {
    /// A wrong pair leaves the session as it was.
    pub fn login(&mut self, login: &str, password: &str) -> bool {
        if login == LOGIN && password == PASSWORD {
            self.logged_in = true;
        }
        self.logged_in
    }

    pub fn logout(&mut self) {
        self.logged_in = false;
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }
}
