//! The DID Document model.
//!
//! Documents are built either from decoded key material (`did:key`,
//! `did:jwk`) or from loosely-typed JSON fetched over the network
//! (`did:web`). Loading is tolerant about key casing: `verificationMethod`,
//! `verification_method` and `VerificationMethod` all bind to the same field.
//! Members this model does not know about are preserved verbatim in `extra`
//! so a document survives a decode/encode round trip.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ResolutionError;

/// The DID Core JSON-LD context
pub const DID_CORE_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// A verification relationship of a DID Document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl Relationship {
    pub const ALL: [Relationship; 5] = [
        Relationship::Authentication,
        Relationship::AssertionMethod,
        Relationship::KeyAgreement,
        Relationship::CapabilityInvocation,
        Relationship::CapabilityDelegation,
    ];

    /// The relationships a signing key is authorized for
    pub const SIGNING: [Relationship; 4] = [
        Relationship::Authentication,
        Relationship::AssertionMethod,
        Relationship::CapabilityInvocation,
        Relationship::CapabilityDelegation,
    ];

    /// The member name used in the JSON representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Authentication => "authentication",
            Relationship::AssertionMethod => "assertionMethod",
            Relationship::KeyAgreement => "keyAgreement",
            Relationship::CapabilityInvocation => "capabilityInvocation",
            Relationship::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

/// The `controller` property: a single DID or a set of DIDs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Controller {
    One(String),
    Many(Vec<String>),
}

impl Controller {
    fn to_json(&self) -> Value {
        match self {
            Controller::One(did) => Value::String(did.clone()),
            Controller::Many(dids) => {
                Value::Array(dids.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Public key material of a verification method, carried unchanged
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
    Jwk(Value),
    Multibase(String),
    Base58(String),
    Hex(String),
    Pem(String),
}

impl PublicKey {
    /// The member name used in the JSON representation
    pub fn member_name(&self) -> &'static str {
        match self {
            PublicKey::Jwk(_) => "publicKeyJwk",
            PublicKey::Multibase(_) => "publicKeyMultibase",
            PublicKey::Base58(_) => "publicKeyBase58",
            PublicKey::Hex(_) => "publicKeyHex",
            PublicKey::Pem(_) => "publicKeyPem",
        }
    }

    fn to_json(&self) -> Value {
        match self {
            PublicKey::Jwk(jwk) => jwk.clone(),
            PublicKey::Multibase(s)
            | PublicKey::Base58(s)
            | PublicKey::Hex(s)
            | PublicKey::Pem(s) => Value::String(s.clone()),
        }
    }
}

/// A verification method in a DID Document
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationMethod {
    /// The unique identifier for this verification method
    pub id: String,

    /// The type of the verification method
    pub method_type: String,

    /// The controller of this verification method
    pub controller: String,

    /// The public key, in whichever format the method carries it
    pub public_key: Option<PublicKey>,

    /// Members not covered above
    pub extra: Map<String, Value>,

    /// `controller` was absent from the source JSON and filled in from the document id
    controller_implied: bool,
}

impl VerificationMethod {
    pub fn new(
        id: impl Into<String>,
        method_type: impl Into<String>,
        controller: impl Into<String>,
        public_key: PublicKey,
    ) -> Self {
        Self {
            id: id.into(),
            method_type: method_type.into(),
            controller: controller.into(),
            public_key: Some(public_key),
            extra: Map::new(),
            controller_implied: false,
        }
    }

    /// Returns the JWK if the key is carried as `publicKeyJwk`
    pub fn public_key_jwk(&self) -> Option<&Value> {
        match &self.public_key {
            Some(PublicKey::Jwk(jwk)) => Some(jwk),
            _ => None,
        }
    }

    /// Returns the multibase string if the key is carried as `publicKeyMultibase`
    pub fn public_key_multibase(&self) -> Option<&str> {
        match &self.public_key {
            Some(PublicKey::Multibase(mb)) => Some(mb),
            _ => None,
        }
    }

    /// Builds a verification method from its JSON form. `id` and `type` are
    /// required; a missing controller defaults to `default_controller` and is
    /// left out again by [`VerificationMethod::to_json`].
    pub fn from_json(value: &Value, default_controller: &str) -> Result<Self, ResolutionError> {
        let Value::Object(map) = value else {
            return Err(invalid_document("verification method must be a JSON object"));
        };

        let mut id = None;
        let mut method_type = None;
        let mut controller = None;
        let mut public_key = None;
        let mut extra = Map::new();

        for (key, value) in map {
            let slot = match normalize_key(key).as_str() {
                "id" => {
                    id = Some(string_member("verification method id", value)?);
                    continue;
                }
                "type" => {
                    method_type = Some(string_member("verification method type", value)?);
                    continue;
                }
                "controller" => {
                    controller = Some(string_member("verification method controller", value)?);
                    continue;
                }
                "publickeyjwk" => Some(PublicKey::Jwk(value.clone())),
                "publickeymultibase" => Some(PublicKey::Multibase(string_member(key, value)?)),
                "publickeybase58" => Some(PublicKey::Base58(string_member(key, value)?)),
                "publickeyhex" => Some(PublicKey::Hex(string_member(key, value)?)),
                "publickeypem" => Some(PublicKey::Pem(string_member(key, value)?)),
                _ => None,
            };

            match slot {
                Some(key_material) => public_key = Some(key_material),
                None => {
                    extra.insert(key.clone(), value.clone());
                }
            }
        }

        let id = id.ok_or_else(|| invalid_document("verification method is missing 'id'"))?;
        let method_type = method_type
            .ok_or_else(|| {
                invalid_document(format!("verification method {id} is missing 'type'"))
            })?;

        Ok(Self {
            id,
            method_type,
            controller_implied: controller.is_none(),
            controller: controller.unwrap_or_else(|| default_controller.to_string()),
            public_key,
            extra,
        })
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("type".to_string(), Value::String(self.method_type.clone()));
        if !self.controller_implied {
            map.insert("controller".to_string(), Value::String(self.controller.clone()));
        }
        if let Some(key) = &self.public_key {
            map.insert(key.member_name().to_string(), key.to_json());
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

impl Serialize for VerificationMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// An entry of a verification relationship list
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationRelationship {
    /// Reference to a verification method by id or `#fragment`
    Reference(String),
    /// A verification method embedded in the relationship itself
    Embedded(VerificationMethod),
}

impl VerificationRelationship {
    fn from_json(value: &Value, subject: &str) -> Result<Self, ResolutionError> {
        match value {
            Value::String(reference) => Ok(Self::Reference(reference.clone())),
            Value::Object(_) => Ok(Self::Embedded(VerificationMethod::from_json(value, subject)?)),
            _ => Err(invalid_document(
                "verification relationship entries must be strings or objects",
            )),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Reference(reference) => Value::String(reference.clone()),
            Self::Embedded(vm) => vm.to_json(),
        }
    }
}

/// A service endpoint in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// The unique identifier for this service
    pub id: String,

    /// The type of the service, a string or a set of strings
    #[serde(rename = "type")]
    pub service_type: Value,

    /// The endpoint URL or object
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("type".to_string(), self.service_type.clone());
        map.insert("serviceEndpoint".to_string(), self.service_endpoint.clone());
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// A DID Document as defined by W3C DID Core
#[derive(Debug, Clone, PartialEq)]
pub struct DidDocument {
    /// The DID subject
    pub id: String,

    /// JSON-LD contexts, usually URIs
    pub context: Vec<Value>,

    /// Other identifiers for the DID subject
    pub also_known_as: Vec<String>,

    pub controller: Option<Controller>,

    pub verification_method: Vec<VerificationMethod>,

    pub authentication: Vec<VerificationRelationship>,

    pub assertion_method: Vec<VerificationRelationship>,

    pub key_agreement: Vec<VerificationRelationship>,

    pub capability_invocation: Vec<VerificationRelationship>,

    pub capability_delegation: Vec<VerificationRelationship>,

    pub service: Vec<Service>,

    /// Top-level members this model does not know about
    pub extra: Map<String, Value>,
}

impl DidDocument {
    /// Creates an empty document for `id` with the DID Core context
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context: vec![Value::String(DID_CORE_CONTEXT.to_string())],
            also_known_as: Vec::new(),
            controller: None,
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            key_agreement: Vec::new(),
            capability_invocation: Vec::new(),
            capability_delegation: Vec::new(),
            service: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Adds `vm` to `verificationMethod` and references it from each of
    /// `relationships`
    pub fn add_verification_method(
        &mut self,
        vm: VerificationMethod,
        relationships: &[Relationship],
    ) {
        for relationship in relationships {
            self.relationship_mut(*relationship)
                .push(VerificationRelationship::Reference(vm.id.clone()));
        }
        self.verification_method.push(vm);
    }

    pub fn relationship(&self, relationship: Relationship) -> &[VerificationRelationship] {
        match relationship {
            Relationship::Authentication => &self.authentication,
            Relationship::AssertionMethod => &self.assertion_method,
            Relationship::KeyAgreement => &self.key_agreement,
            Relationship::CapabilityInvocation => &self.capability_invocation,
            Relationship::CapabilityDelegation => &self.capability_delegation,
        }
    }

    fn relationship_mut(
        &mut self,
        relationship: Relationship,
    ) -> &mut Vec<VerificationRelationship> {
        match relationship {
            Relationship::Authentication => &mut self.authentication,
            Relationship::AssertionMethod => &mut self.assertion_method,
            Relationship::KeyAgreement => &mut self.key_agreement,
            Relationship::CapabilityInvocation => &mut self.capability_invocation,
            Relationship::CapabilityDelegation => &mut self.capability_delegation,
        }
    }

    /// Looks up a verification method by absolute id or by `#fragment`
    /// relative to the document subject.
    ///
    /// Only `verificationMethod` is searched; ids pointing into other
    /// documents are not dereferenced.
    pub fn find_verification_method(&self, reference: &str) -> Option<&VerificationMethod> {
        let target = self.absolute_id(reference);
        self.verification_method
            .iter()
            .find(|vm| self.absolute_id(&vm.id) == target)
    }

    /// Resolves every entry of a relationship to a verification method.
    /// Embedded methods are returned as-is, references that do not resolve
    /// are skipped.
    pub fn verification_methods_for(&self, relationship: Relationship) -> Vec<&VerificationMethod> {
        self.relationship(relationship)
            .iter()
            .filter_map(|entry| match entry {
                VerificationRelationship::Reference(reference) => {
                    self.find_verification_method(reference)
                }
                VerificationRelationship::Embedded(vm) => Some(vm),
            })
            .collect()
    }

    /// Looks up a service by absolute id or by `#fragment`
    pub fn find_service(&self, reference: &str) -> Option<&Service> {
        let target = self.absolute_id(reference);
        self.service.iter().find(|s| self.absolute_id(&s.id) == target)
    }

    fn absolute_id(&self, reference: &str) -> String {
        if reference.starts_with('#') {
            format!("{}{}", self.id, reference)
        } else {
            reference.to_string()
        }
    }

    /// Builds a document from loosely-typed JSON
    pub fn from_json(value: &Value) -> Result<Self, ResolutionError> {
        let Value::Object(map) = value else {
            return Err(invalid_document("DID document must be a JSON object"));
        };

        let id = map
            .iter()
            .find(|(key, _)| normalize_key(key) == "id")
            .map(|(_, value)| string_member("id", value))
            .transpose()?
            .ok_or_else(|| invalid_document("DID document is missing 'id'"))?;

        let mut doc = DidDocument::new(id.clone());

        for (key, value) in map {
            match normalize_key(key).as_str() {
                "id" => {}
                "context" => doc.context = parse_context(value)?,
                "alsoknownas" => {
                    doc.also_known_as = match value {
                        Value::String(s) => vec![s.clone()],
                        _ => serde_json::from_value(value.clone())
                            .map_err(|e| invalid_document(format!("invalid alsoKnownAs: {e}")))?,
                    }
                }
                "controller" => {
                    doc.controller = Some(
                        serde_json::from_value(value.clone())
                            .map_err(|e| invalid_document(format!("invalid controller: {e}")))?,
                    )
                }
                "verificationmethod" => {
                    doc.verification_method = array_member("verificationMethod", value)?
                        .iter()
                        .map(|vm| VerificationMethod::from_json(vm, &id))
                        .collect::<Result<_, _>>()?
                }
                "service" => {
                    doc.service = array_member("service", value)?
                        .iter()
                        .map(|s| {
                            serde_json::from_value(s.clone())
                                .map_err(|e| invalid_document(format!("invalid service: {e}")))
                        })
                        .collect::<Result<_, _>>()?
                }
                normalized => match relationship_for_key(normalized) {
                    Some(relationship) => {
                        *doc.relationship_mut(relationship) =
                            array_member(relationship.as_str(), value)?
                                .iter()
                                .map(|entry| VerificationRelationship::from_json(entry, &id))
                                .collect::<Result<_, _>>()?
                    }
                    None => {
                        doc.extra.insert(key.clone(), value.clone());
                    }
                },
            }
        }

        Ok(doc)
    }

    /// Serializes the document. Empty collections are omitted and unknown
    /// members are appended last.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("@context".to_string(), Value::Array(self.context.clone()));
        map.insert("id".to_string(), Value::String(self.id.clone()));

        if !self.also_known_as.is_empty() {
            map.insert(
                "alsoKnownAs".to_string(),
                Value::Array(self.also_known_as.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(controller) = &self.controller {
            map.insert("controller".to_string(), controller.to_json());
        }
        if !self.verification_method.is_empty() {
            map.insert(
                "verificationMethod".to_string(),
                Value::Array(
                    self.verification_method
                        .iter()
                        .map(VerificationMethod::to_json)
                        .collect(),
                ),
            );
        }
        for relationship in Relationship::ALL {
            let entries = self.relationship(relationship);
            if !entries.is_empty() {
                map.insert(
                    relationship.as_str().to_string(),
                    Value::Array(entries.iter().map(VerificationRelationship::to_json).collect()),
                );
            }
        }
        if !self.service.is_empty() {
            map.insert(
                "service".to_string(),
                Value::Array(self.service.iter().map(Service::to_json).collect()),
            );
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }

        Value::Object(map)
    }
}

impl Serialize for DidDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DidDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DidDocument::from_json(&value).map_err(de::Error::custom)
    }
}

/// Folds a member name to the form used for matching: lowercase, without
/// `@`, `_` or `-`
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '@' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn relationship_for_key(normalized: &str) -> Option<Relationship> {
    Relationship::ALL
        .into_iter()
        .find(|relationship| normalize_key(relationship.as_str()) == normalized)
}

fn parse_context(value: &Value) -> Result<Vec<Value>, ResolutionError> {
    match value {
        Value::Null => Ok(vec![Value::String(DID_CORE_CONTEXT.to_string())]),
        Value::String(_) | Value::Object(_) => Ok(vec![value.clone()]),
        Value::Array(items) => Ok(items.clone()),
        _ => Err(invalid_document("@context must be a string, object or array")),
    }
}

fn string_member(name: &str, value: &Value) -> Result<String, ResolutionError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_document(format!("'{name}' must be a string")))
}

fn array_member<'a>(name: &str, value: &'a Value) -> Result<&'a Vec<Value>, ResolutionError> {
    value
        .as_array()
        .ok_or_else(|| invalid_document(format!("'{name}' must be an array")))
}

fn invalid_document(msg: impl Into<String>) -> ResolutionError {
    ResolutionError::InvalidDidDocument(msg.into())
}
