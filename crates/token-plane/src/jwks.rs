use serde::{Deserialize, Serialize};

use crate::keys::{KeySet, PublicKey};

/// One entry of a published JWKS document (spec.md §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JwksKey {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub usage: String,
    pub alg: String,
    pub n: String,
    pub e: String,
}

impl From<&PublicKey> for JwksKey {
    fn from(key: &PublicKey) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: key.kid.clone(),
            usage: "sig".to_string(),
            alg: "RS256".to_string(),
            n: key.n.clone(),
            e: key.e.clone(),
        }
    }
}

impl JwksKey {
    pub fn to_public_key(&self) -> PublicKey {
        PublicKey {
            kid: self.kid.clone(),
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }
}

/// `{"keys":[...]}`, served at `/api/auth/jwks` and
/// `/.well-known/jwks.json` (spec.md §6).
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct JwksDocument {
    pub keys: Vec<JwksKey>,
}

impl From<&KeySet> for JwksDocument {
    fn from(set: &KeySet) -> Self {
        Self {
            keys: set.keys().iter().map(JwksKey::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Signer;

    #[test]
    fn jwks_document_serializes_with_stable_field_names() {
        let signer = Signer::generate().unwrap();
        let mut set = KeySet::new();
        set.add(signer.public_key().clone());
        let doc = JwksDocument::from(&set);

        let json = serde_json::to_value(&doc).unwrap();
        let key = &json["keys"][0];
        assert_eq!(key["kty"], "RSA");
        assert_eq!(key["use"], "sig");
        assert_eq!(key["alg"], "RS256");
        assert!(key["n"].is_string());
        assert!(key["e"].is_string());
    }
}
