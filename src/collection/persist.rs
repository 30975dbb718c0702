//! Persisted form of the collection tree
//!
//! Items nest their children and omit the parent link. Loading rebuilds the
//! parent links in a single pre-order pass.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Collection, Item, ItemKind, RequestItem};
use crate::auth::Authentication;
use crate::error::StorageError;
use crate::models::{Headers, HttpMethod, RequestBody};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PersistedItem {
    #[serde(rename = "UUID")]
    uuid: Uuid,
    is_group: bool,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(default)]
    headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_body: Option<RequestBody>,
    #[serde(default)]
    authentication: Authentication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<PersistedItem>>,
}

/// Methods this client cannot send load as GET
fn persisted_method(id: Uuid, name: Option<&str>) -> HttpMethod {
    let Some(name) = name else {
        return HttpMethod::default();
    };
    HttpMethod::from_name(name).unwrap_or_else(|| {
        tracing::warn!(%id, method = name, "Unknown method, loading as GET");
        HttpMethod::default()
    })
}

impl Collection {
    fn to_persisted(&self, id: Uuid) -> Option<PersistedItem> {
        let item = self.get(id)?;
        let persisted = match &item.kind {
            ItemKind::Group(children) => PersistedItem {
                uuid: item.uuid,
                is_group: true,
                name: item.name.clone(),
                method: None,
                url: String::new(),
                headers: Headers::new(),
                request_body: None,
                authentication: Authentication::None,
                children: Some(
                    children
                        .iter()
                        .filter_map(|child| self.to_persisted(*child))
                        .collect(),
                ),
            },
            ItemKind::Request(request) => PersistedItem {
                uuid: item.uuid,
                is_group: false,
                name: item.name.clone(),
                method: Some(request.method.as_str().to_string()),
                url: request.url.clone(),
                headers: request.headers.clone(),
                request_body: request.body.clone(),
                authentication: request.authentication.clone(),
                children: None,
            },
        };
        Some(persisted)
    }

    fn from_persisted(root: PersistedItem) -> Result<Collection, StorageError> {
        if !root.is_group {
            return Err(StorageError::Corrupt("collection root is not a group".into()));
        }

        let root_id = root.uuid;
        let mut items = HashMap::new();
        restore(&mut items, root, None)?;
        Ok(Collection {
            root: root_id,
            items,
        })
    }
}

fn restore(
    items: &mut HashMap<Uuid, Item>,
    persisted: PersistedItem,
    parent: Option<Uuid>,
) -> Result<(), StorageError> {
    let id = persisted.uuid;
    if items.contains_key(&id) {
        return Err(StorageError::Corrupt(format!("duplicate item {}", id)));
    }

    if !persisted.is_group {
        if persisted.children.as_ref().is_some_and(|c| !c.is_empty()) {
            return Err(StorageError::Corrupt(format!("request {} has children", id)));
        }
        let request = RequestItem {
            method: persisted_method(id, persisted.method.as_deref()),
            url: persisted.url,
            body: persisted.request_body,
            headers: persisted.headers,
            authentication: persisted.authentication,
            result: None,
        };
        items.insert(
            id,
            Item {
                uuid: id,
                name: persisted.name,
                parent,
                kind: ItemKind::Request(Box::new(request)),
            },
        );
        return Ok(());
    }

    let children = persisted.children.unwrap_or_default();
    let child_ids = children.iter().map(|c| c.uuid).collect();
    items.insert(
        id,
        Item {
            uuid: id,
            name: persisted.name,
            parent,
            kind: ItemKind::Group(child_ids),
        },
    );
    for child in children {
        restore(items, child, Some(id))?;
    }
    Ok(())
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_persisted(self.root).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let root = PersistedItem::deserialize(deserializer)?;
        Collection::from_persisted(root).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Authentication;

    fn sample() -> Collection {
        let mut c = Collection::new("Default");
        let root = c.root();
        let api = c.add_child(root, Item::new_group("api", Some(root))).unwrap();
        let users = c
            .add_child(api, Item::new_request("users", HttpMethod::POST, "http://x/users", Some(api)))
            .unwrap();
        let request = c.request_mut(users).unwrap();
        request.add_header("Accept", "application/json");
        request.body = Some(RequestBody::new(r#"{"a":1}"#, "application/json"));
        request.authentication = Authentication::basic("u", "p");
        c.add_child(root, Item::new_request("health", HttpMethod::GET, "", Some(root)));
        c
    }

    #[test]
    fn test_round_trip_keeps_shape_ids_and_parents() {
        let original = sample();
        let json = serde_json::to_string(&original).unwrap();
        let loaded: Collection = serde_json::from_str(&json).unwrap();

        let before: Vec<(Uuid, Option<Uuid>, String)> = original
            .preorder()
            .map(|i| (i.uuid(), i.parent(), i.name().to_string()))
            .collect();
        let after: Vec<(Uuid, Option<Uuid>, String)> = loaded
            .preorder()
            .map(|i| (i.uuid(), i.parent(), i.name().to_string()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(loaded.root(), original.root());

        for item in loaded.preorder() {
            if let Some(parent) = item.parent() {
                assert!(loaded.children(parent).contains(&item.uuid()));
            }
        }

        let users = loaded.children(loaded.children(loaded.root())[0])[0];
        let request = loaded.request(users).unwrap();
        assert_eq!(request.method, HttpMethod::POST);
        assert_eq!(request.headers["Accept"], vec!["application/json"]);
        assert_eq!(request.authentication, Authentication::basic("u", "p"));
        assert!(request.body.is_some());
    }

    #[test]
    fn test_serialized_fields() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["IsGroup"], true);
        assert_eq!(json["Name"], "Default");
        assert!(json.get("Parent").is_none());
        let users = &json["Children"][0]["Children"][0];
        assert_eq!(users["Method"], "POST");
        assert_eq!(users["URL"], "http://x/users");
        assert_eq!(users["RequestBody"]["ContentType"], "application/json");
        assert_eq!(users["Authentication"]["Type"], "basic");
        assert!(users.get("Children").is_none());
        assert!(json["Children"][1].get("RequestBody").is_none());
    }

    #[test]
    fn test_request_root_is_corrupt() {
        let json = format!(
            r#"{{"UUID":"{}","IsGroup":false,"Name":"x","Method":"GET","URL":""}}"#,
            Uuid::new_v4()
        );
        assert!(serde_json::from_str::<Collection>(&json).is_err());
    }

    #[test]
    fn test_duplicate_ids_are_corrupt() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"UUID":"{id}","IsGroup":true,"Name":"root","Children":[
                {{"UUID":"{id}","IsGroup":false,"Name":"dup","Method":"GET","URL":""}}]}}"#
        );
        assert!(serde_json::from_str::<Collection>(&json).is_err());
    }

    #[test]
    fn test_unknown_method_loads_as_get() {
        let request = Uuid::new_v4();
        let json = format!(
            r#"{{"UUID":"{}","IsGroup":true,"Name":"root","Children":[
                {{"UUID":"{request}","IsGroup":false,"Name":"trace","Method":"TRACE","URL":"http://x"}},
                {{"UUID":"{}","IsGroup":false,"Name":"lower","Method":"put","URL":""}}]}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );

        let collection: Collection = serde_json::from_str(&json).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.request(request).unwrap().method, HttpMethod::GET);
        assert_eq!(collection.request(request).unwrap().url, "http://x");
        let lower = collection.children(collection.root())[1];
        assert_eq!(collection.request(lower).unwrap().method, HttpMethod::PUT);
    }
}
