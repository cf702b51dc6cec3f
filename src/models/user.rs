use actix_service::{self, Transform};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    Error, HttpMessage,
};
use chrono::Utc;
use futures::{
    future::{ready, LocalBoxFuture, Ready},
    FutureExt,
};
use jsonwebtoken::{self, decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::{rc::Rc, str::FromStr};

use crate::config::{Config, KeyMaterial};

#[derive(Debug, Serialize, Deserialize)]
struct UserClaims {
    exp: i64,
    iss: String,
    sub: String,
    company: String,
}

/// The current user on whose behalf an action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: ObjectId,
    pub company_id: ObjectId,
}

pub type UserAuthentication = Rc<Actor>;

#[derive(Clone)]
pub struct Keys {
    algorithm: Algorithm,
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
    issuer: String,
}

impl Keys {
    pub fn from_config(config: &Config) -> Result<Self, jsonwebtoken::errors::Error> {
        match &config.keys {
            KeyMaterial::Secret(secret) => Ok(Self {
                algorithm: Algorithm::HS256,
                encoding: Some(EncodingKey::from_secret(secret.as_bytes())),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                issuer: config.issuer.clone(),
            }),
            KeyMaterial::Rsa {
                public_pem,
                private_pem,
            } => Ok(Self {
                algorithm: Algorithm::RS256,
                encoding: private_pem
                    .as_ref()
                    .map(|pem| EncodingKey::from_rsa_pem(pem.as_bytes()))
                    .transpose()?,
                decoding: DecodingKey::from_rsa_pem(public_pem.as_bytes())?,
                issuer: config.issuer.clone(),
            }),
        }
    }

    /// Signs a token for `actor`, valid for one day.
    pub fn issue(&self, actor: &Actor) -> crate::error::Result<String> {
        let claims: UserClaims = UserClaims {
            sub: actor.user_id.to_hex(),
            company: actor.company_id.to_hex(),
            exp: Utc::now().timestamp() + 86400,
            iss: self.issuer.clone(),
        };
        let key: &EncodingKey = self.encoding.as_ref().ok_or_else(|| {
            crate::error::Error::Store("no signing key configured".to_string())
        })?;
        Ok(encode(&Header::new(self.algorithm), &claims, key)?)
    }

    pub fn verify(&self, token: &str) -> Option<Actor> {
        let mut validation: Validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<UserClaims>(token, &self.decoding, &validation).ok()?;
        Some(Actor {
            user_id: ObjectId::from_str(&data.claims.sub).ok()?,
            company_id: ObjectId::from_str(&data.claims.company).ok()?,
        })
    }
}

pub struct UserAuthenticationMiddleware<S> {
    service: Rc<S>,
    keys: Rc<Keys>,
}
pub struct UserAuthenticationMiddlewareFactory {
    keys: Rc<Keys>,
}

impl UserAuthenticationMiddlewareFactory {
    pub fn new(keys: Keys) -> Self {
        Self {
            keys: Rc::new(keys),
        }
    }
}

impl<S, B> Service<ServiceRequest> for UserAuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv: Rc<S> = self.service.clone();
        let keys: Rc<Keys> = self.keys.clone();

        async move {
            let actor: Option<Actor> = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .and_then(|token| keys.verify(token));
            if let Some(actor) = actor {
                req.extensions_mut()
                    .insert::<UserAuthentication>(Rc::new(actor));
            }
            let res: ServiceResponse<B> = srv.call(req).await?;
            Ok(res)
        }
        .boxed_local()
    }
}
impl<S, B> Transform<S, ServiceRequest> for UserAuthenticationMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = UserAuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(UserAuthenticationMiddleware {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn keys(issuer: &str) -> Keys {
        let mut config = Config::for_secret("test-secret", PathBuf::from("./files"));
        config.issuer = issuer.to_string();
        Keys::from_config(&config).unwrap()
    }

    #[test]
    fn issued_tokens_verify_to_the_same_actor() {
        let keys = keys("safety-insurance");
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        let token = keys.issue(&actor).unwrap();
        assert_eq!(keys.verify(&token), Some(actor));
    }

    #[test]
    fn tokens_from_another_issuer_are_rejected() {
        let actor = Actor {
            user_id: ObjectId::new(),
            company_id: ObjectId::new(),
        };
        let token = keys("someone-else").issue(&actor).unwrap();
        assert_eq!(keys("safety-insurance").verify(&token), None);
        assert_eq!(keys("safety-insurance").verify("garbage"), None);
    }
}
