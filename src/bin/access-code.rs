//! Prints the Argon2id hash to put in ACCESS_CODE_HASH.
//!
//! Usage: access-code <code>

use std::env;
use tradedesk::auth::hash_access_code;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let code = env::args()
        .nth(1)
        .ok_or("usage: access-code <code>")?;
    if code.trim().is_empty() {
        return Err("access code must not be blank".into());
    }

    println!("{}", hash_access_code(&code)?);
    Ok(())
}
