// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that tokens created by `create_jwt` can be decoded
//! with the claims format the middleware expects, catching compatibility
//! issues early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pawsteps::middleware::auth::{create_jwt, Claims};

#[test]
fn test_jwt_roundtrip() {
    let signing_key = b"test_signing_key_32_bytes_long!!";
    let user_id = "8f14e45f-ea3e-4f2a-b4c1-6d3a2e9b0c17";

    let token = create_jwt(user_id, signing_key).expect("Failed to create JWT");

    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let token_data =
        decode::<Claims>(&token, &key, &validation).expect("Middleware-style decode failed");

    assert_eq!(token_data.claims.sub, user_id);
    assert!(token_data.claims.exp > token_data.claims.iat);
}

#[test]
fn test_jwt_rejects_wrong_key() {
    let token = create_jwt("user-1", b"key_number_one_32_bytes_long!!!!").unwrap();

    let key = DecodingKey::from_secret(b"key_number_two_32_bytes_long!!!!");
    let validation = Validation::new(Algorithm::HS256);

    assert!(decode::<Claims>(&token, &key, &validation).is_err());
}
