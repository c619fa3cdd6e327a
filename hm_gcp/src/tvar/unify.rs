//! Destructive unification.
//!
//! Unification is total: shapes that cannot be reconciled produce an
//! [`TKind::Error`] node instead of failing. Two variables are linked before
//! their children are visited, so cyclic types terminate.

use super::{TError, TKind, TVarArena, TVarId};
use crate::lattice::{StructLattice, Value};
use crate::worklist::Worklist;

type Pending = Vec<(TVarId, TVarId)>;

impl TVarArena {
    /// Unify `a` and `b`. Returns true if any variable changed; every
    /// changed variable's dependents are pushed onto `work`.
    pub fn unify(&mut self, a: TVarId, b: TVarId, structs: &mut impl StructLattice, work: &mut Worklist) -> bool {
        let mut pending: Pending = vec![(a, b)];
        let mut progress = false;
        while let Some((a, b)) = pending.pop() {
            let (a, b) = (self.find(a), self.find(b));
            if a == b {
                continue;
            }
            progress = true;
            let ka = self.nodes[a.index()].kind.clone();
            let kb = self.nodes[b.index()].kind.clone();
            match (ka, kb) {
                (TKind::Leaf, _) => self.union(a, b, work),
                (_, TKind::Leaf) => self.union(b, a, work),
                (TKind::Error(_), kb) => self.absorb_into_error(a, b, kb, &mut pending, structs, work),
                (ka, TKind::Error(_)) => self.absorb_into_error(b, a, ka, &mut pending, structs, work),
                (TKind::Base(x), TKind::Base(y)) => {
                    let met = x.meet(&y, structs);
                    if met == Value::Scalar {
                        self.make_error(a, b, TKind::Base(x), TKind::Base(y), work);
                    } else {
                        self.union(b, a, work);
                        self.nodes[a.index()].kind = TKind::Base(met);
                    }
                }
                (TKind::Nil(c), TKind::Base(v)) if is_numeric(&v) => {
                    self.union(a, b, work);
                    pending.push((c, b));
                }
                (TKind::Base(v), TKind::Nil(c)) if is_numeric(&v) => {
                    self.union(b, a, work);
                    pending.push((c, a));
                }
                (TKind::Nil(c1), TKind::Nil(c2)) => {
                    self.union(b, a, work);
                    pending.push((c1, c2));
                }
                (TKind::Nil(c), other) => {
                    let copy = self.alloc(other);
                    self.union(b, a, work);
                    pending.push((c, copy));
                }
                (other, TKind::Nil(c)) => {
                    let copy = self.alloc(other);
                    self.union(a, b, work);
                    pending.push((c, copy));
                }
                (
                    TKind::Fun {
                        fidxs: f1,
                        args: args1,
                        ret: r1,
                    },
                    TKind::Fun {
                        fidxs: f2,
                        args: args2,
                        ret: r2,
                    },
                ) => {
                    if args1.len() != args2.len() {
                        let ka = TKind::Fun {
                            fidxs: f1,
                            args: args1,
                            ret: r1,
                        };
                        let kb = TKind::Fun {
                            fidxs: f2,
                            args: args2,
                            ret: r2,
                        };
                        self.make_error(a, b, ka, kb, work);
                        continue;
                    }
                    self.union(b, a, work);
                    pending.extend(args1.iter().copied().zip(args2.iter().copied()));
                    pending.push((r1, r2));
                    self.nodes[a.index()].kind = TKind::Fun {
                        fidxs: f1.union(&f2).copied().collect(),
                        args: args1,
                        ret: r1,
                    };
                }
                (
                    TKind::Struct {
                        aliases: a1,
                        open: o1,
                        fields: f1,
                    },
                    TKind::Struct {
                        aliases: a2,
                        open: o2,
                        fields: f2,
                    },
                ) => {
                    self.union(b, a, work);
                    let mut fields = f1.clone();
                    for (name, &t2) in &f2 {
                        match f1.get(name) {
                            Some(&t1) => pending.push((t1, t2)),
                            None => {
                                if !o1 {
                                    let err = self.alloc(TKind::Error(Box::new(missing_field(name))));
                                    pending.push((err, t2));
                                }
                                fields.insert(name.clone(), t2);
                            }
                        }
                    }
                    for (name, &t1) in &f1 {
                        if !f2.contains_key(name) && !o2 {
                            let err = self.alloc(TKind::Error(Box::new(missing_field(name))));
                            pending.push((err, t1));
                        }
                    }
                    self.nodes[a.index()].kind = TKind::Struct {
                        aliases: a1.union(&a2).copied().collect(),
                        open: o1 && o2,
                        fields,
                    };
                }
                (ka, kb) => self.make_error(a, b, ka, kb, work),
            }
        }
        progress
    }

    /// Link root `from` into root `into`, merging and waking dependents.
    fn union(&mut self, from: TVarId, into: TVarId, work: &mut Worklist) {
        let deps = std::mem::take(&mut self.nodes[from.index()].deps);
        self.nodes[from.index()].link = Some(into);
        work.extend(deps.iter().copied());
        let into_deps = &mut self.nodes[into.index()].deps;
        work.extend(into_deps.iter().copied());
        for dep in deps {
            if !into_deps.contains(&dep) {
                into_deps.push(dep);
            }
        }
    }

    fn make_error(&mut self, a: TVarId, b: TVarId, ka: TKind, kb: TKind, work: &mut Worklist) {
        log::trace!("cannot unify {} and {}", ka.tag(), kb.tag());
        self.union(b, a, work);
        self.nodes[a.index()].kind = TKind::Error(Box::new(TError {
            alts: vec![ka, kb],
            msg: None,
        }));
    }

    /// Merge `other` (with kind `kind`) into the error root `err`.
    fn absorb_into_error(
        &mut self,
        err: TVarId,
        other: TVarId,
        kind: TKind,
        pending: &mut Pending,
        structs: &mut impl StructLattice,
        work: &mut Worklist,
    ) {
        self.union(other, err, work);
        let TKind::Error(mut error) = std::mem::replace(&mut self.nodes[err.index()].kind, TKind::Leaf) else {
            return;
        };
        add_alt(&mut error, kind, pending, structs);
        self.nodes[err.index()].kind = TKind::Error(error);
    }
}

fn is_numeric(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Flt(_))
}

fn missing_field(name: &str) -> TError {
    TError::with_msg(format!("Missing field {}", name))
}

/// Add a shape to an error, merging with an alternative of the same shape.
fn add_alt(err: &mut TError, kind: TKind, pending: &mut Pending, structs: &mut impl StructLattice) {
    match kind {
        TKind::Leaf => {}
        TKind::Error(other) => {
            let TError { alts, msg } = *other;
            for alt in alts {
                add_alt(err, alt, pending, structs);
            }
            if err.msg.is_none() {
                err.msg = msg;
            }
        }
        TKind::Base(v) => {
            for alt in err.alts.iter_mut() {
                if let TKind::Base(x) = alt {
                    let met = x.meet(&v, structs);
                    if met != Value::Scalar {
                        *x = met;
                        return;
                    }
                }
            }
            err.alts.push(TKind::Base(v));
        }
        TKind::Fun { fidxs, args, ret } => {
            for alt in err.alts.iter_mut() {
                if let TKind::Fun {
                    fidxs: f,
                    args: a,
                    ret: r,
                } = alt
                {
                    if a.len() == args.len() {
                        f.extend(fidxs);
                        pending.extend(a.iter().copied().zip(args));
                        pending.push((*r, ret));
                        return;
                    }
                }
            }
            err.alts.push(TKind::Fun { fidxs, args, ret });
        }
        TKind::Struct { aliases, open, fields } => {
            for alt in err.alts.iter_mut() {
                if let TKind::Struct {
                    aliases: al,
                    open: op,
                    fields: fs,
                } = alt
                {
                    al.extend(aliases);
                    *op = *op && open;
                    for (name, t) in fields {
                        match fs.get(&name) {
                            Some(&existing) => pending.push((existing, t)),
                            None => {
                                fs.insert(name, t);
                            }
                        }
                    }
                    return;
                }
            }
            err.alts.push(TKind::Struct { aliases, open, fields });
        }
        TKind::Nil(child) => {
            for alt in err.alts.iter() {
                if let TKind::Nil(existing) = alt {
                    pending.push((*existing, child));
                    return;
                }
            }
            err.alts.push(TKind::Nil(child));
        }
    }
}
