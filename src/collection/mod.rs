//! Collection tree - groups and saved requests
//!
//! Items live in a flat table keyed by UUID. Groups keep an ordered list of
//! child ids and every non-root item keeps the id of its parent, so the tree
//! never holds a reference cycle.

mod persist;

use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::Authentication;
use crate::constants::{HEADER_VALUE_SEPARATOR, PATH_SEPARATOR};
use crate::error::TreeError;
use crate::models::{Headers, HttpMethod, HttpResult, RequestBody};

/// Request payload of a non-group item
#[derive(Clone, Debug, Default)]
pub struct RequestItem {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<RequestBody>,
    pub headers: Headers,
    pub authentication: Authentication,
    /// Last exchange outcome, never persisted
    pub result: Option<HttpResult>,
}

impl RequestItem {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        RequestItem {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.entry(key.into()).or_default().push(value.into());
    }

    pub fn remove_header(&mut self, key: &str) {
        self.headers.remove(key);
    }

    /// Values of a header joined for single-line editing
    pub fn header_line(&self, key: &str) -> Option<String> {
        self.headers
            .get(key)
            .map(|values| values.join(HEADER_VALUE_SEPARATOR))
    }

    /// Replaces a header's values with those found in `line`
    pub fn set_header_line(&mut self, key: impl Into<String>, line: &str) {
        self.headers.insert(key.into(), split_header_line(line));
    }

    /// Applies an edit that may also rename the header. Renaming onto an
    /// existing key appends to that key's values.
    pub fn edit_header(&mut self, prev_key: &str, key: &str, line: &str) {
        let values = split_header_line(line);
        if prev_key == key {
            self.headers.insert(key.to_string(), values);
            return;
        }

        self.headers.remove(prev_key);
        self.headers
            .entry(key.to_string())
            .or_default()
            .extend(values);
    }

    /// Body content type, falling back to a `Content-Type` header
    pub fn content_type(&self) -> Option<&str> {
        if let Some(body) = &self.body {
            return Some(body.content_type.as_str());
        }

        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    /// `None` drops the body, otherwise creates an empty one or retypes it
    pub fn set_content_type(&mut self, content_type: Option<&str>) {
        match (content_type, &mut self.body) {
            (None, _) => self.body = None,
            (Some(ct), Some(body)) => body.content_type = ct.to_string(),
            (Some(ct), None) => self.body = Some(RequestBody::new("", ct)),
        }
    }

    pub fn set_payload(&mut self, payload: impl Into<String>) {
        if let Some(body) = &mut self.body {
            body.payload = payload.into();
        }
    }
}

fn split_header_line(line: &str) -> Vec<String> {
    line.split(HEADER_VALUE_SEPARATOR).map(str::to_string).collect()
}

#[derive(Clone, Debug)]
enum ItemKind {
    Group(Vec<Uuid>),
    Request(Box<RequestItem>),
}

/// A node of the collection tree
#[derive(Clone, Debug)]
pub struct Item {
    uuid: Uuid,
    name: String,
    parent: Option<Uuid>,
    kind: ItemKind,
}

impl Item {
    /// A new, empty group. Attach it with [`Collection::add_child`].
    pub fn new_group(name: impl Into<String>, parent: Option<Uuid>) -> Self {
        Item {
            uuid: Uuid::new_v4(),
            name: name.into(),
            parent,
            kind: ItemKind::Group(Vec::new()),
        }
    }

    /// A new request. Attach it with [`Collection::add_child`].
    pub fn new_request(
        name: impl Into<String>,
        method: HttpMethod,
        url: impl Into<String>,
        parent: Option<Uuid>,
    ) -> Self {
        Item::from_request(name, RequestItem::new(method, url), parent)
    }

    pub fn from_request(name: impl Into<String>, request: RequestItem, parent: Option<Uuid>) -> Self {
        Item {
            uuid: Uuid::new_v4(),
            name: name.into(),
            parent,
            kind: ItemKind::Request(Box::new(request)),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ItemKind::Group(_))
    }

    /// Child ids in order; always empty for requests
    pub fn children(&self) -> &[Uuid] {
        match &self.kind {
            ItemKind::Group(children) => children,
            ItemKind::Request(_) => &[],
        }
    }

    pub fn request(&self) -> Option<&RequestItem> {
        match &self.kind {
            ItemKind::Request(request) => Some(request),
            ItemKind::Group(_) => None,
        }
    }

    pub fn request_mut(&mut self) -> Option<&mut RequestItem> {
        match &mut self.kind {
            ItemKind::Request(request) => Some(request),
            ItemKind::Group(_) => None,
        }
    }

    /// Shallow copy with a fresh identity, no children and no result
    fn duplicate(&self, name: String, parent: Option<Uuid>) -> Item {
        let kind = match &self.kind {
            ItemKind::Group(_) => ItemKind::Group(Vec::new()),
            ItemKind::Request(request) => {
                let mut copy = request.clone();
                copy.result = None;
                ItemKind::Request(copy)
            }
        };
        Item {
            uuid: Uuid::new_v4(),
            name,
            parent,
            kind,
        }
    }
}

/// The rooted tree of saved items
#[derive(Clone, Debug)]
pub struct Collection {
    root: Uuid,
    items: HashMap<Uuid, Item>,
}

impl Collection {
    /// A collection holding only an empty root group
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Item::new_group(root_name, None);
        let id = root.uuid;
        let mut items = HashMap::new();
        items.insert(id, root);
        Collection { root: id, items }
    }

    pub fn root(&self) -> Uuid {
        self.root
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn parent(&self, id: Uuid) -> Option<Uuid> {
        self.items.get(&id).and_then(|item| item.parent)
    }

    pub fn children(&self, id: Uuid) -> &[Uuid] {
        self.items.get(&id).map(Item::children).unwrap_or(&[])
    }

    pub fn request(&self, id: Uuid) -> Option<&RequestItem> {
        self.items.get(&id).and_then(Item::request)
    }

    pub fn request_mut(&mut self, id: Uuid) -> Option<&mut RequestItem> {
        self.items.get_mut(&id).and_then(Item::request_mut)
    }

    /// Appends `item` to a group's children. Returns `None` without changing
    /// the tree if `parent` is not a group.
    pub fn add_child(&mut self, parent: Uuid, item: Item) -> Option<Uuid> {
        self.attach(parent, item, |children| Some(children.len()))
    }

    /// Inserts `item` right after `after` among the group's children.
    /// Returns `None` without changing the tree if `after` is not found.
    pub fn insert_child_after(&mut self, parent: Uuid, item: Item, after: Uuid) -> Option<Uuid> {
        self.attach(parent, item, |children| {
            children.iter().position(|c| *c == after).map(|i| i + 1)
        })
    }

    fn attach(
        &mut self,
        parent: Uuid,
        mut item: Item,
        position: impl FnOnce(&[Uuid]) -> Option<usize>,
    ) -> Option<Uuid> {
        let id = item.uuid;
        if self.items.contains_key(&id) {
            return None;
        }

        let ItemKind::Group(children) = &mut self.items.get_mut(&parent)?.kind else {
            return None;
        };
        let index = position(children)?;
        children.insert(index, id);

        item.parent = Some(parent);
        if let ItemKind::Group(grandchildren) = &mut item.kind {
            // only attached items may be referenced as children
            grandchildren.clear();
        }
        self.items.insert(id, item);
        Some(id)
    }

    /// Detaches `child` from `parent` and drops its whole subtree
    pub fn remove_child(&mut self, parent: Uuid, child: Uuid) -> Result<(), TreeError> {
        let item = self
            .items
            .get_mut(&parent)
            .ok_or(TreeError::ItemNotFound(parent))?;
        let ItemKind::Group(children) = &mut item.kind else {
            return Err(TreeError::NotAGroup(parent));
        };
        let index = children
            .iter()
            .position(|c| *c == child)
            .ok_or(TreeError::ChildNotFound { parent, child })?;
        children.remove(index);

        let doomed: Vec<Uuid> = self.subtree(child).map(Item::uuid).collect();
        for id in doomed {
            self.items.remove(&id);
        }
        Ok(())
    }

    /// Removes an item and its subtree. The root is never removed; `Ok(false)`
    /// is returned for it.
    pub fn remove_item(&mut self, id: Uuid) -> Result<bool, TreeError> {
        if id == self.root {
            return Ok(false);
        }
        let parent = self.parent(id).ok_or(TreeError::ItemNotFound(id))?;
        self.remove_child(parent, id)?;
        Ok(true)
    }

    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> Result<(), TreeError> {
        let item = self.items.get_mut(&id).ok_or(TreeError::ItemNotFound(id))?;
        item.name = name.into();
        Ok(())
    }

    /// Path from the root down to the item's parent, root first
    pub fn ancestors(&self, id: Uuid) -> Vec<Uuid> {
        let mut ancestors = Vec::new();
        let mut node = self.parent(id);
        while let Some(current) = node {
            ancestors.push(current);
            node = self.parent(current);
        }
        ancestors.reverse();
        ancestors
    }

    pub fn is_descendant_of(&self, id: Uuid, ancestor: Uuid) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// Names from the root down to the item, e.g. `Default > Users`
    pub fn path_label(&self, id: Uuid) -> String {
        self.ancestors(id)
            .into_iter()
            .chain(std::iter::once(id))
            .filter_map(|i| self.get(i))
            .map(Item::name)
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    /// Closest group containing the item, or the item itself if it is a group
    pub fn nearest_group(&self, id: Uuid) -> Uuid {
        match self.get(id) {
            Some(item) if item.is_group() => id,
            Some(item) => item.parent.unwrap_or(self.root),
            None => self.root,
        }
    }

    /// Pre-order walk of the whole tree
    pub fn preorder(&self) -> Preorder<'_> {
        self.subtree(self.root)
    }

    /// Pre-order walk starting at `id`, including it
    pub fn subtree(&self, id: Uuid) -> Preorder<'_> {
        Preorder {
            collection: self,
            stack: vec![id],
        }
    }

    pub fn first_request(&self) -> Option<Uuid> {
        self.preorder()
            .find(|item| !item.is_group())
            .map(Item::uuid)
    }

    /// Copies an item under a new name right after the original. Groups are
    /// copied with their whole subtree; every copy gets a fresh UUID.
    pub fn clone_item(&mut self, id: Uuid, name: impl Into<String>) -> Result<Uuid, TreeError> {
        if id == self.root {
            return Err(TreeError::RootItem);
        }
        let parent = self.parent(id).ok_or(TreeError::ItemNotFound(id))?;
        let copy = self.copy_subtree(id, Some(name.into()), parent)?;

        let ItemKind::Group(children) = &mut self
            .items
            .get_mut(&parent)
            .ok_or(TreeError::ItemNotFound(parent))?
            .kind
        else {
            return Err(TreeError::NotAGroup(parent));
        };
        let index = children
            .iter()
            .position(|c| *c == id)
            .ok_or(TreeError::ChildNotFound { parent, child: id })?;
        children.insert(index + 1, copy);
        Ok(copy)
    }

    fn copy_subtree(&mut self, source: Uuid, name: Option<String>, parent: Uuid) -> Result<Uuid, TreeError> {
        let original = self.items.get(&source).ok_or(TreeError::ItemNotFound(source))?;
        let name = name.unwrap_or_else(|| original.name.clone());
        let mut copy = original.duplicate(name, Some(parent));
        let source_children = original.children().to_vec();
        let copy_id = copy.uuid;

        let mut copied = Vec::with_capacity(source_children.len());
        for child in source_children {
            copied.push(self.copy_subtree(child, None, copy_id)?);
        }
        if let ItemKind::Group(children) = &mut copy.kind {
            *children = copied;
        }

        self.items.insert(copy_id, copy);
        Ok(copy_id)
    }
}

/// Pre-order iterator over a collection subtree
pub struct Preorder<'a> {
    collection: &'a Collection,
    stack: Vec<Uuid>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(item) = self.collection.get(id) {
                self.stack.extend(item.children().iter().rev());
                return Some(item);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root
    ///   api
    ///     users (request)
    ///     admin
    ///       audit (request)
    ///   health (request)
    fn sample() -> (Collection, [Uuid; 5]) {
        let mut c = Collection::new("root");
        let root = c.root();
        let api = c.add_child(root, Item::new_group("api", Some(root))).unwrap();
        let users = c
            .add_child(api, Item::new_request("users", HttpMethod::GET, "http://x/users", Some(api)))
            .unwrap();
        let admin = c.add_child(api, Item::new_group("admin", Some(api))).unwrap();
        let audit = c
            .add_child(admin, Item::new_request("audit", HttpMethod::POST, "http://x/audit", Some(admin)))
            .unwrap();
        let health = c
            .add_child(root, Item::new_request("health", HttpMethod::GET, "http://x/health", Some(root)))
            .unwrap();
        (c, [api, users, admin, audit, health])
    }

    #[test]
    fn test_ancestors_are_root_first_and_match_depth() {
        let (c, [api, users, admin, audit, health]) = sample();
        let root = c.root();

        assert!(c.ancestors(root).is_empty());
        assert_eq!(c.ancestors(api), vec![root]);
        assert_eq!(c.ancestors(users), vec![root, api]);
        assert_eq!(c.ancestors(audit), vec![root, api, admin]);
        assert_eq!(c.ancestors(health), vec![root]);

        assert!(c.is_descendant_of(audit, api));
        assert!(!c.is_descendant_of(health, api));
        assert!(!c.is_descendant_of(root, root));
    }

    #[test]
    fn test_add_child_to_request_is_noop() {
        let (mut c, [_, users, ..]) = sample();
        let before = c.len();

        let added = c.add_child(users, Item::new_group("nope", None));

        assert!(added.is_none());
        assert_eq!(c.len(), before);
        assert!(c.children(users).is_empty());
    }

    #[test]
    fn test_insert_child_after_unknown_sibling_is_noop() {
        let (mut c, [api, users, admin, ..]) = sample();

        let missing = c.insert_child_after(api, Item::new_group("x", None), Uuid::new_v4());
        assert!(missing.is_none());
        assert_eq!(c.children(api), &[users, admin]);

        let inserted = c
            .insert_child_after(api, Item::new_group("x", None), users)
            .unwrap();
        assert_eq!(c.children(api), &[users, inserted, admin]);
        assert_eq!(c.parent(inserted), Some(api));
    }

    #[test]
    fn test_remove_child_errors() {
        let (mut c, [api, users, _, audit, _]) = sample();

        assert_eq!(c.remove_child(users, audit), Err(TreeError::NotAGroup(users)));
        assert_eq!(
            c.remove_child(api, audit),
            Err(TreeError::ChildNotFound { parent: api, child: audit })
        );
    }

    #[test]
    fn test_remove_group_drops_subtree() {
        let (mut c, [api, users, admin, audit, health]) = sample();

        assert_eq!(c.remove_item(api), Ok(true));

        for id in [api, users, admin, audit] {
            assert!(!c.contains(id));
        }
        assert_eq!(c.children(c.root()), &[health]);
        for item in c.preorder() {
            assert!(item.parent().map_or(true, |p| ![api, admin].contains(&p)));
        }
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_remove_root_is_noop() {
        let (mut c, _) = sample();
        let root = c.root();
        assert_eq!(c.remove_item(root), Ok(false));
        assert_eq!(c.len(), 6);
    }

    #[test]
    fn test_preorder_and_first_request() {
        let (c, [api, users, admin, audit, health]) = sample();
        let order: Vec<Uuid> = c.preorder().map(Item::uuid).collect();
        assert_eq!(order, vec![c.root(), api, users, admin, audit, health]);
        assert_eq!(c.first_request(), Some(users));
    }

    #[test]
    fn test_clone_request_inserts_after_original() {
        let mut c = Collection::new("root");
        let root = c.root();
        let foo = c
            .add_child(root, Item::new_request("Foo", HttpMethod::GET, "http://x", Some(root)))
            .unwrap();
        let other = c
            .add_child(root, Item::new_request("Other", HttpMethod::GET, "", Some(root)))
            .unwrap();
        {
            let request = c.request_mut(foo).unwrap();
            request.add_header("Accept", "application/json");
            request.body = Some(RequestBody::new("{}", "application/json"));
        }

        let bar = c.clone_item(foo, "Bar").unwrap();

        assert_ne!(bar, foo);
        assert_eq!(c.children(root), &[foo, bar, other]);
        assert_eq!(c.get(bar).unwrap().name(), "Bar");
        let (orig, copy) = (c.request(foo).unwrap(), c.request(bar).unwrap());
        assert_eq!(copy.method, orig.method);
        assert_eq!(copy.url, "http://x");
        assert_eq!(copy.body, orig.body);

        c.request_mut(bar).unwrap().add_header("X-Copy", "1");
        assert!(!c.request(foo).unwrap().headers.contains_key("X-Copy"));
    }

    #[test]
    fn test_clone_group_is_deep() {
        let (mut c, [api, users, admin, audit, _]) = sample();

        let copy = c.clone_item(api, "api copy").unwrap();

        let copied: Vec<&Item> = c.subtree(copy).collect();
        assert_eq!(copied.len(), 4);
        for item in &copied {
            assert!(![api, users, admin, audit].contains(&item.uuid()));
        }
        let names: Vec<&str> = copied.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["api copy", "users", "admin", "audit"]);
        let audit_copy = copied[3].uuid();
        assert!(c.is_descendant_of(audit_copy, copy));
        assert_eq!(c.children(c.root())[1], copy);
    }

    #[test]
    fn test_clone_root_is_rejected() {
        let (mut c, _) = sample();
        let root = c.root();
        assert_eq!(c.clone_item(root, "x"), Err(TreeError::RootItem));
    }

    #[test]
    fn test_path_label_and_nearest_group() {
        let (c, [api, users, admin, audit, _]) = sample();
        assert_eq!(c.path_label(audit), "root > api > admin > audit");
        assert_eq!(c.nearest_group(users), api);
        assert_eq!(c.nearest_group(admin), admin);
    }

    #[test]
    fn test_header_line_editing() {
        let mut request = RequestItem::new(HttpMethod::GET, "");
        request.add_header("Accept", "text/html");
        request.add_header("Accept", "application/json");
        assert_eq!(request.header_line("Accept").unwrap(), "text/html; application/json");

        request.set_header_line("X-Tags", "a; b; c");
        assert_eq!(request.headers["X-Tags"], vec!["a", "b", "c"]);

        request.edit_header("X-Tags", "Accept", "d");
        assert!(!request.headers.contains_key("X-Tags"));
        assert_eq!(request.headers["Accept"], vec!["text/html", "application/json", "d"]);
    }

    #[test]
    fn test_content_type_prefers_body() {
        let mut request = RequestItem::new(HttpMethod::POST, "");
        request.add_header("content-type", "text/plain");
        assert_eq!(request.content_type(), Some("text/plain"));

        request.set_content_type(Some("application/json"));
        assert_eq!(request.content_type(), Some("application/json"));
        request.set_payload("{}");
        assert_eq!(request.body.as_ref().unwrap().payload, "{}");

        request.set_content_type(None);
        assert!(request.body.is_none());
    }
}
