//! In-memory [`Filesystem`] used to replay plans against synthetic trees.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::FsOpsResult;
use crate::fs::{EntryKind, Filesystem};
use crate::model::LinkEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Node {
    Dir,
    File(u64),
}

#[derive(Debug)]
struct State {
    nodes: BTreeMap<PathBuf, Node>,
    next_inode: u64,
    same_device: bool,
}

#[derive(Debug)]
pub(crate) struct MemoryFilesystem {
    state: Mutex<State>,
}

impl MemoryFilesystem {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                nodes: BTreeMap::from([(PathBuf::from("/"), Node::Dir)]),
                next_inode: 1,
                same_device: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add_file(&self, path: &str) {
        let path = PathBuf::from(path);
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut state.nodes, parent);
        }
        let inode = state.next_inode;
        state.next_inode += 1;
        state.nodes.insert(path, Node::File(inode));
    }

    pub(crate) fn set_same_device(&self, same_device: bool) {
        self.lock().same_device = same_device;
    }

    pub(crate) fn inode(&self, path: &str) -> Option<u64> {
        match self.lock().nodes.get(Path::new(path)) {
            Some(Node::File(inode)) => Some(*inode),
            _ => None,
        }
    }

    pub(crate) fn is_dir(&self, path: &str) -> bool {
        matches!(self.lock().nodes.get(Path::new(path)), Some(Node::Dir))
    }

    pub(crate) fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(Path::new(path))
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<PathBuf, Node> {
        self.lock().nodes.clone()
    }
}

fn insert_dirs(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors() {
        nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
}

impl Filesystem for MemoryFilesystem {
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        Ok(self.lock().nodes.get(path).map(|node| match node {
            Node::Dir => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        }))
    }

    fn walk_tree(&self, root: &Path) -> FsOpsResult<Vec<LinkEntry>> {
        Ok(self
            .lock()
            .nodes
            .iter()
            .filter(|(path, _)| path.starts_with(root) && path.as_path() != root)
            .filter_map(|(path, node)| {
                path.strip_prefix(root).ok().map(|relative| LinkEntry {
                    relative_path: relative.to_path_buf(),
                    is_directory: *node == Node::Dir,
                })
            })
            .collect())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if let Some(Node::File(_)) = state.nodes.get(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "file in the way"));
        }
        insert_dirs(&mut state.nodes, path);
        Ok(())
    }

    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        let mut state = self.lock();
        let Some(Node::File(inode)) = state.nodes.get(original).copied() else {
            return Err(not_found(original));
        };
        let parent_is_dir = link
            .parent()
            .is_some_and(|parent| state.nodes.get(parent) == Some(&Node::Dir));
        if !parent_is_dir {
            return Err(not_found(link));
        }
        if state.nodes.contains_key(link) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "link exists"));
        }
        state.nodes.insert(link.to_path_buf(), Node::File(inode));
        Ok(())
    }

    fn same_file(&self, first: &Path, second: &Path) -> io::Result<bool> {
        let state = self.lock();
        let inode_of = |path: &Path| match state.nodes.get(path) {
            Some(Node::File(inode)) => Ok(Some(*inode)),
            Some(Node::Dir) => Ok(None),
            None => Err(not_found(path)),
        };
        let (first, second) = (inode_of(first)?, inode_of(second)?);
        Ok(first.is_some() && first == second)
    }

    fn same_device(&self, _original: &Path, _destination: &Path) -> io::Result<bool> {
        Ok(self.lock().same_device)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        match state.nodes.get(path) {
            Some(Node::File(_)) => {
                state.nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(io::Error::other("is a directory")),
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if !state.nodes.contains_key(path) {
            return Err(not_found(path));
        }
        state.nodes.retain(|candidate, _| !candidate.starts_with(path));
        Ok(())
    }
}
