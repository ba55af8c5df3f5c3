/// 32 random bytes, hex encoded. Used for verification and reset links.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}
