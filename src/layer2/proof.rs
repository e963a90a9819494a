//! IAVL range proofs for layer-2 state.
//!
//! Hashing (SHA-256 throughout):
//! ```text
//! leaf  = H(zz(0) | zz(1) | zz(version) | lp(key) | lp(value_hash))
//! inner = H(zz(height) | zz(size) | zz(version) | lp(left) | lp(right))
//! ```
//! `zz` is a zig-zag varint, `lp` a uvarint length prefix. On a path the
//! child hash fills whichever side (`left` or `right`) is empty. Paths are
//! stored root first.
//!
//! A proof covers `leaves.len()` consecutive leaves: `left_path` leads to the
//! first one, and every non-empty right sibling met while walking back up is
//! proven by hashing the next entry of `inner_nodes` with the next leaf.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::blockchain::codec::{ByteReader, ByteWriter, CodecError};

pub const HASH_SIZE: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Malformed(String),

    #[error("computed root hash does not match the state root")]
    RootMismatch,

    #[error("intermediate root hash does not match its sibling on the path")]
    IntermediateRootMismatch,

    #[error("key not found in proof")]
    KeyNotFound,

    #[error("value hash does not match the proven leaf")]
    ValueMismatch,
}

impl From<CodecError> for ProofError {
    fn from(e: CodecError) -> Self {
        ProofError::Malformed(e.to_string())
    }
}

/// Inner node on a path from the root down to a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofInnerNode {
    pub height: i8,
    pub size: i64,
    pub version: i64,
    pub left: Vec<u8>,
    pub right: Vec<u8>,
}

impl ProofInnerNode {
    /// Hash of this node with `child` on its empty side.
    pub fn hash_with_child(&self, child: &[u8]) -> [u8; HASH_SIZE] {
        let mut buf = Vec::with_capacity(96);
        put_varint(&mut buf, self.height as i64);
        put_varint(&mut buf, self.size);
        put_varint(&mut buf, self.version);
        if self.left.is_empty() {
            put_len_prefixed(&mut buf, child);
            put_len_prefixed(&mut buf, &self.right);
        } else {
            put_len_prefixed(&mut buf, &self.left);
            put_len_prefixed(&mut buf, child);
        }
        Sha256::digest(&buf).into()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofLeafNode {
    pub key: Vec<u8>,
    pub value_hash: Vec<u8>,
    pub version: i64,
}

impl ProofLeafNode {
    /// Leaf for `key` holding `value`.
    pub fn new(key: &[u8], value: &[u8], version: i64) -> Self {
        Self {
            key: key.to_vec(),
            value_hash: Sha256::digest(value).to_vec(),
            version,
        }
    }

    pub fn hash(&self) -> [u8; HASH_SIZE] {
        let mut buf = Vec::with_capacity(96);
        put_varint(&mut buf, 0);
        put_varint(&mut buf, 1);
        put_varint(&mut buf, self.version);
        put_len_prefixed(&mut buf, &self.key);
        put_len_prefixed(&mut buf, &self.value_hash);
        Sha256::digest(&buf).into()
    }
}

/// Inner nodes from the root (first) down to a leaf (last).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathToLeaf(pub Vec<ProofInnerNode>);

impl PathToLeaf {
    /// Root hash reached by hashing `leaf_hash` up this path.
    pub fn root_hash(&self, leaf_hash: [u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
        path_root(&self.0, leaf_hash)
    }
}

fn path_root(path: &[ProofInnerNode], leaf_hash: [u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
    path.iter()
        .rev()
        .fold(leaf_hash, |hash, node| node.hash_with_child(&hash))
}

/// Range proof as published by the layer-2 node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeProof {
    pub left_path: PathToLeaf,
    pub inner_nodes: Vec<PathToLeaf>,
    pub leaves: Vec<ProofLeafNode>,
}

/// A range proof whose root has been checked; only these can vouch for items.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedRangeProof<'a> {
    proof: &'a RangeProof,
}

impl RangeProof {
    /// Decode the node's binary proof encoding.
    pub fn decode(data: &[u8]) -> Result<Self, ProofError> {
        let mut reader = ByteReader::new(data);
        let left_path = read_path(&mut reader)?;

        let count = reader.read_var_uint()?;
        let mut inner_nodes = Vec::new();
        for _ in 0..count {
            inner_nodes.push(read_path(&mut reader)?);
        }

        let count = reader.read_var_uint()?;
        let mut leaves = Vec::new();
        for _ in 0..count {
            leaves.push(ProofLeafNode {
                key: reader.read_var_bytes()?.to_vec(),
                value_hash: reader.read_var_bytes()?.to_vec(),
                version: reader.read_u64()? as i64,
            });
        }

        Ok(Self {
            left_path,
            inner_nodes,
            leaves,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        write_path(&mut w, &self.left_path);
        w.write_var_uint(self.inner_nodes.len() as u64);
        for path in &self.inner_nodes {
            write_path(&mut w, path);
        }
        w.write_var_uint(self.leaves.len() as u64);
        for leaf in &self.leaves {
            w.write_var_bytes(&leaf.key);
            w.write_var_bytes(&leaf.value_hash);
            w.write_u64(leaf.version as u64);
        }
        w.into_bytes()
    }

    /// Root hash implied by the proof's leaves and paths.
    pub fn compute_root_hash(&self) -> Result<[u8; HASH_SIZE], ProofError> {
        if self.leaves.is_empty() {
            return Err(ProofError::Malformed("no leaves".into()));
        }
        if self.inner_nodes.len() + 1 != self.leaves.len() {
            return Err(ProofError::Malformed(format!(
                "{} inner paths for {} leaves",
                self.inner_nodes.len(),
                self.leaves.len()
            )));
        }

        let walk = RootWalk {
            leaves: &self.leaves,
            inner_nodes: &self.inner_nodes,
        };
        walk.compute(&self.left_path.0)
    }

    /// Check the proof is internally consistent and anchored at `root`.
    pub fn verify(&self, root: &[u8]) -> Result<VerifiedRangeProof<'_>, ProofError> {
        if self.compute_root_hash()?.as_slice() != root {
            return Err(ProofError::RootMismatch);
        }
        Ok(VerifiedRangeProof { proof: self })
    }
}

impl VerifiedRangeProof<'_> {
    /// Check the proof attests `key` holding exactly `value`.
    pub fn verify_item(&self, key: &[u8], value: &[u8]) -> Result<(), ProofError> {
        let leaves = &self.proof.leaves;
        let i = leaves.partition_point(|leaf| leaf.key.as_slice() < key);
        let leaf = leaves
            .get(i)
            .filter(|leaf| leaf.key == key)
            .ok_or(ProofError::KeyNotFound)?;
        if leaf.value_hash.as_slice() != Sha256::digest(value).as_slice() {
            return Err(ProofError::ValueMismatch);
        }
        Ok(())
    }
}

/// Verify `(key, value)` against `state_root` using an encoded proof.
pub fn verify_store_proof(
    key: &[u8],
    value: &[u8],
    proof: &[u8],
    state_root: &[u8],
) -> Result<(), ProofError> {
    let proof = RangeProof::decode(proof)?;
    proof.verify(state_root)?.verify_item(key, value)
}

/// Consumes leaves and inner paths left to right while rebuilding the root.
struct RootWalk<'a> {
    leaves: &'a [ProofLeafNode],
    inner_nodes: &'a [PathToLeaf],
}

/// A subtree being rebuilt: the hash above its first leaf, the part of its
/// path not yet scanned for right siblings, and the sibling hash its parent
/// expects it to produce.
struct Frame<'a> {
    hash: [u8; HASH_SIZE],
    remaining: &'a [ProofInnerNode],
    expected: Option<&'a [u8]>,
}

impl<'a> RootWalk<'a> {
    /// Root hash over all leaves, starting from the path to the first one.
    ///
    /// Pending subtrees live on an explicit stack, so proof size never turns
    /// into call depth.
    fn compute(mut self, left_path: &'a [ProofInnerNode]) -> Result<[u8; HASH_SIZE], ProofError> {
        let mut stack = vec![self.enter(left_path, None)?];

        loop {
            if self.leaves.is_empty() {
                return unwind(stack);
            }

            let frame = stack
                .last_mut()
                .ok_or_else(|| ProofError::Malformed("left over leaves".into()))?;
            let mut remaining: &'a [ProofInnerNode] = frame.remaining;
            let mut sibling = None;
            while let Some((last, upper)) = remaining.split_last() {
                remaining = upper;
                if !last.right.is_empty() {
                    sibling = Some(last.right.as_slice());
                    break;
                }
            }
            frame.remaining = remaining;

            match sibling {
                Some(right) => {
                    let inner_nodes: &'a [PathToLeaf] = self.inner_nodes;
                    let (next, rest) = inner_nodes
                        .split_first()
                        .ok_or_else(|| ProofError::Malformed("ran out of inner paths".into()))?;
                    self.inner_nodes = rest;
                    let child = self.enter(&next.0, Some(right))?;
                    stack.push(child);
                }
                None => {
                    // Subtree finished with leaves still pending: hand back to its parent.
                    if let Some(frame) = stack.pop() {
                        check_sibling(&frame)?;
                    }
                    if stack.is_empty() {
                        return Err(ProofError::Malformed("left over leaves".into()));
                    }
                }
            }
        }
    }

    /// Take the next leaf and hash it up `path`.
    fn enter(
        &mut self,
        path: &'a [ProofInnerNode],
        expected: Option<&'a [u8]>,
    ) -> Result<Frame<'a>, ProofError> {
        let leaves: &'a [ProofLeafNode] = self.leaves;
        let (leaf, rest) = leaves
            .split_first()
            .ok_or_else(|| ProofError::Malformed("ran out of leaves".into()))?;
        self.leaves = rest;

        Ok(Frame {
            hash: path_root(path, leaf.hash()),
            remaining: path,
            expected,
        })
    }
}

fn check_sibling(frame: &Frame<'_>) -> Result<(), ProofError> {
    match frame.expected {
        Some(expected) if expected != frame.hash.as_slice() => {
            Err(ProofError::IntermediateRootMismatch)
        }
        _ => Ok(()),
    }
}

/// Close every open subtree, innermost first, and return the outermost hash.
fn unwind(mut stack: Vec<Frame<'_>>) -> Result<[u8; HASH_SIZE], ProofError> {
    let mut root = None;
    while let Some(frame) = stack.pop() {
        check_sibling(&frame)?;
        root = Some(frame.hash);
    }
    root.ok_or_else(|| ProofError::Malformed("no leaves".into()))
}

fn read_path(reader: &mut ByteReader<'_>) -> Result<PathToLeaf, ProofError> {
    let count = reader.read_var_uint()?;
    let mut nodes = Vec::new();
    for _ in 0..count {
        nodes.push(ProofInnerNode {
            height: reader.read_u8()? as i8,
            size: reader.read_u64()? as i64,
            version: reader.read_u64()? as i64,
            left: reader.read_var_bytes()?.to_vec(),
            right: reader.read_var_bytes()?.to_vec(),
        });
    }
    Ok(PathToLeaf(nodes))
}

fn write_path(w: &mut ByteWriter, path: &PathToLeaf) {
    w.write_var_uint(path.0.len() as u64);
    for node in &path.0 {
        w.write_u8(node.height as u8);
        w.write_u64(node.size as u64);
        w.write_u64(node.version as u64);
        w.write_var_bytes(&node.left);
        w.write_var_bytes(&node.right);
    }
}

fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn put_varint(buf: &mut Vec<u8>, value: i64) {
    put_uvarint(buf, ((value << 1) ^ (value >> 63)) as u64);
}

fn put_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_uvarint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner(height: i8, size: i64, left: Vec<u8>, right: Vec<u8>) -> ProofInnerNode {
        ProofInnerNode {
            height,
            size,
            version: 1,
            left,
            right,
        }
    }

    /// Tree of three leaves `a`, `b`, `c`:
    ///
    /// ```text
    ///         root
    ///        /    \
    ///      ab      c
    ///     /  \
    ///    a    b
    /// ```
    struct Tree {
        a: ProofLeafNode,
        b: ProofLeafNode,
        c: ProofLeafNode,
        root: [u8; HASH_SIZE],
    }

    fn tree() -> Tree {
        let a = ProofLeafNode::new(b"a", b"apple", 1);
        let b = ProofLeafNode::new(b"b", b"banana", 1);
        let c = ProofLeafNode::new(b"c", b"cherry", 1);
        let ab = inner(1, 2, a.hash().to_vec(), vec![]).hash_with_child(&b.hash());
        let root = inner(2, 3, ab.to_vec(), vec![]).hash_with_child(&c.hash());
        Tree { a, b, c, root }
    }

    /// Single-leaf proof for `b`.
    fn proof_for_b(t: &Tree) -> RangeProof {
        RangeProof {
            left_path: PathToLeaf(vec![
                inner(2, 3, vec![], t.c.hash().to_vec()),
                inner(1, 2, t.a.hash().to_vec(), vec![]),
            ]),
            inner_nodes: vec![],
            leaves: vec![t.b.clone()],
        }
    }

    #[test]
    fn test_zigzag_varint() {
        let mut buf = Vec::new();
        put_varint(&mut buf, 0);
        put_varint(&mut buf, -1);
        put_varint(&mut buf, 1);
        put_varint(&mut buf, 64);
        assert_eq!(buf, vec![0x00, 0x01, 0x02, 0x80, 0x01]);
    }

    #[test]
    fn test_single_leaf_proof_verifies() {
        let t = tree();
        let proof = proof_for_b(&t);
        assert_eq!(proof.compute_root_hash().unwrap(), t.root);
        let verified = proof.verify(&t.root).unwrap();
        assert!(verified.verify_item(b"b", b"banana").is_ok());
    }

    #[test]
    fn test_long_leaf_chain_fails_cleanly() {
        const LEAVES: usize = 100_000;
        let node = || inner(1, 2, vec![], vec![0xaa]);
        let proof = RangeProof {
            left_path: PathToLeaf(vec![node()]),
            inner_nodes: (1..LEAVES).map(|_| PathToLeaf(vec![node()])).collect(),
            leaves: (0..LEAVES)
                .map(|i| ProofLeafNode::new(&(i as u64).to_be_bytes(), b"v", 1))
                .collect(),
        };
        let blob = proof.encode();

        let err = verify_store_proof(b"k", b"v", &blob, &[0; HASH_SIZE]).unwrap_err();
        assert!(
            matches!(err, ProofError::Malformed(_) | ProofError::IntermediateRootMismatch),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_multi_leaf_proof_verifies() {
        let t = tree();
        // a is the leftmost leaf; b and c follow via the right siblings
        // met on the way up.
        let proof = RangeProof {
            left_path: PathToLeaf(vec![
                inner(2, 3, vec![], t.c.hash().to_vec()),
                inner(1, 2, vec![], t.b.hash().to_vec()),
            ]),
            inner_nodes: vec![PathToLeaf(vec![]), PathToLeaf(vec![])],
            leaves: vec![t.a.clone(), t.b.clone(), t.c.clone()],
        };
        let verified = proof.verify(&t.root).unwrap();
        assert!(verified.verify_item(b"a", b"apple").is_ok());
        assert!(verified.verify_item(b"c", b"cherry").is_ok());
        assert_eq!(verified.verify_item(b"bb", b"banana"), Err(ProofError::KeyNotFound));
    }

    #[test]
    fn test_inconsistent_sibling_rejected() {
        let t = tree();
        let wrong = ProofLeafNode::new(b"b", b"blueberry", 1);
        let proof = RangeProof {
            left_path: PathToLeaf(vec![
                inner(2, 3, vec![], t.c.hash().to_vec()),
                inner(1, 2, vec![], t.b.hash().to_vec()),
            ]),
            inner_nodes: vec![PathToLeaf(vec![]), PathToLeaf(vec![])],
            leaves: vec![t.a.clone(), wrong, t.c.clone()],
        };
        assert_eq!(proof.verify(&t.root).unwrap_err(), ProofError::IntermediateRootMismatch);
    }

    #[test]
    fn test_leaf_count_mismatch_rejected() {
        let t = tree();
        let mut proof = proof_for_b(&t);
        proof.inner_nodes.push(PathToLeaf::default());
        assert!(matches!(proof.compute_root_hash(), Err(ProofError::Malformed(_))));
        assert!(matches!(RangeProof::default().compute_root_hash(), Err(ProofError::Malformed(_))));
    }

    #[test]
    fn test_tampered_value_or_root_rejected() {
        let t = tree();
        let blob = proof_for_b(&t).encode();
        assert!(verify_store_proof(b"b", b"banana", &blob, &t.root).is_ok());

        let mut value = b"banana".to_vec();
        for i in 0..value.len() {
            value[i] ^= 0x01;
            assert_eq!(
                verify_store_proof(b"b", &value, &blob, &t.root),
                Err(ProofError::ValueMismatch)
            );
            value[i] ^= 0x01;
        }

        let mut root = t.root;
        for i in 0..root.len() {
            root[i] ^= 0x80;
            assert_eq!(
                verify_store_proof(b"b", b"banana", &blob, &root),
                Err(ProofError::RootMismatch)
            );
            root[i] ^= 0x80;
        }
    }

    #[test]
    fn test_verification_is_deterministic() {
        let t = tree();
        let blob = proof_for_b(&t).encode();
        let first = verify_store_proof(b"b", b"banana", &blob, &t.root);
        for _ in 0..10 {
            assert_eq!(verify_store_proof(b"b", b"banana", &blob, &t.root), first);
        }
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let t = tree();
        let blob = proof_for_b(&t).encode();
        let err = verify_store_proof(b"b", b"banana", &blob[..blob.len() - 3], &t.root).unwrap_err();
        assert!(matches!(err, ProofError::Malformed(_)));
    }
}
