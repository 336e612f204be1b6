use std::fmt::Write;

use nom::bytes::streaming::take;
use nom::combinator::map;
use nom::number::streaming::{le_u16, le_u32, le_u64, le_u8};
use nom::sequence::pair;
use rusticata_macros::newtype_enum;

use crate::error::DResult;
use crate::frame::NsTime;
use crate::ninep::fields::*;
use crate::tree::{HeaderField, ItemParser, ItemResult, WireStr};
use crate::value_string::{try_val_to_str, ValueString};

/// Tag of messages outside of any exchange (version negotiation)
pub const NOTAG: u16 = 0xffff;
/// Fid meaning "no fid"
pub const NOFID: u32 = 0xffff_ffff;
/// Maximum number of walk elements in one message
pub const MAXWELEM: usize = 16;
/// `size[4] type[1] tag[2]`
pub const HEADER_LEN: usize = 7;

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct NinePMsgType(pub u8);

newtype_enum! {
impl debug NinePMsgType {
    Rlerror = 7,
    Tstatfs = 8,
    Rstatfs = 9,
    Tlopen = 12,
    Rlopen = 13,
    Tlcreate = 14,
    Rlcreate = 15,
    Tsymlink = 16,
    Rsymlink = 17,
    Tmknod = 18,
    Rmknod = 19,
    Trename = 20,
    Rrename = 21,
    Treadlink = 22,
    Rreadlink = 23,
    Tgetattr = 24,
    Rgetattr = 25,
    Tsetattr = 26,
    Rsetattr = 27,
    Txattrwalk = 30,
    Rxattrwalk = 31,
    Txattrcreate = 32,
    Rxattrcreate = 33,
    Treaddir = 40,
    Rreaddir = 41,
    Tfsync = 50,
    Rfsync = 51,
    Tlock = 52,
    Rlock = 53,
    Tgetlock = 54,
    Rgetlock = 55,
    Tlink = 70,
    Rlink = 71,
    Tmkdir = 72,
    Rmkdir = 73,
    Trenameat = 74,
    Rrenameat = 75,
    Tunlinkat = 76,
    Runlinkat = 77,
    Tversion = 100,
    Rversion = 101,
    Tauth = 102,
    Rauth = 103,
    Tattach = 104,
    Rattach = 105,
    Terror = 106,
    Rerror = 107,
    Tflush = 108,
    Rflush = 109,
    Twalk = 110,
    Rwalk = 111,
    Topen = 112,
    Ropen = 113,
    Tcreate = 114,
    Rcreate = 115,
    Tread = 116,
    Rread = 117,
    Twrite = 118,
    Rwrite = 119,
    Tclunk = 120,
    Rclunk = 121,
    Tremove = 122,
    Rremove = 123,
    Tstat = 124,
    Rstat = 125,
    Twstat = 126,
    Rwstat = 127,
}
}

pub static NINEP_MSG_TYPES: &[ValueString] = &[
    (7, "Rlerror"),
    (8, "Tstatfs"),
    (9, "Rstatfs"),
    (12, "Tlopen"),
    (13, "Rlopen"),
    (14, "Tlcreate"),
    (15, "Rlcreate"),
    (16, "Tsymlink"),
    (17, "Rsymlink"),
    (18, "Tmknod"),
    (19, "Rmknod"),
    (20, "Trename"),
    (21, "Rrename"),
    (22, "Treadlink"),
    (23, "Rreadlink"),
    (24, "Tgetattr"),
    (25, "Rgetattr"),
    (26, "Tsetattr"),
    (27, "Rsetattr"),
    (30, "Txattrwalk"),
    (31, "Rxattrwalk"),
    (32, "Txattrcreate"),
    (33, "Rxattrcreate"),
    (40, "Treaddir"),
    (41, "Rreaddir"),
    (50, "Tfsync"),
    (51, "Rfsync"),
    (52, "Tlock"),
    (53, "Rlock"),
    (54, "Tgetlock"),
    (55, "Rgetlock"),
    (70, "Tlink"),
    (71, "Rlink"),
    (72, "Tmkdir"),
    (73, "Rmkdir"),
    (74, "Trenameat"),
    (75, "Rrenameat"),
    (76, "Tunlinkat"),
    (77, "Runlinkat"),
    (100, "Tversion"),
    (101, "Rversion"),
    (102, "Tauth"),
    (103, "Rauth"),
    (104, "Tattach"),
    (105, "Rattach"),
    (106, "Terror"),
    (107, "Rerror"),
    (108, "Tflush"),
    (109, "Rflush"),
    (110, "Twalk"),
    (111, "Rwalk"),
    (112, "Topen"),
    (113, "Ropen"),
    (114, "Tcreate"),
    (115, "Rcreate"),
    (116, "Tread"),
    (117, "Rread"),
    (118, "Twrite"),
    (119, "Rwrite"),
    (120, "Tclunk"),
    (121, "Rclunk"),
    (122, "Tremove"),
    (123, "Rremove"),
    (124, "Tstat"),
    (125, "Rstat"),
    (126, "Twstat"),
    (127, "Rwstat"),
];

impl NinePMsgType {
    pub fn name(self) -> Option<&'static str> {
        try_val_to_str(u32::from(self.0), NINEP_MSG_TYPES)
    }

    /// Requests have even codes, responses odd ones
    #[inline]
    pub fn is_request(self) -> bool {
        self.0 % 2 == 0
    }
}

/// Protocol dialect, negotiated by Tversion / Rversion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NinePVersion {
    /// `9P2000`
    V2000,
    /// `9P2000.u` (Unix extensions)
    V2000U,
    /// `9P2000.L` (Linux extensions)
    V2000L,
}

impl Default for NinePVersion {
    fn default() -> Self {
        NinePVersion::V2000
    }
}

impl NinePVersion {
    pub fn from_wire(s: &str) -> Option<NinePVersion> {
        match s {
            "9P2000" => Some(NinePVersion::V2000),
            "9P2000.u" => Some(NinePVersion::V2000U),
            "9P2000.L" => Some(NinePVersion::V2000L),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NinePVersion::V2000 => "9P2000",
            NinePVersion::V2000U => "9P2000.u",
            NinePVersion::V2000L => "9P2000.L",
        }
    }

    fn has_numeric_ids(self) -> bool {
        self != NinePVersion::V2000
    }
}

/// Server-side identity of a file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Qid {
    pub qtype: u8,
    pub version: u32,
    pub path: u64,
}

/// Directory entry (Rstat, Twstat)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    pub size: u16,
    pub stype: u16,
    pub dev: u32,
    pub qid: Qid,
    pub mode: u32,
    pub atime: u32,
    pub mtime: u32,
    pub length: u64,
    pub name: String,
    pub uid: String,
    pub gid: String,
    pub muid: String,
    /// 9P2000.u extension
    pub extension: Option<String>,
    pub n_uid: Option<u32>,
    pub n_gid: Option<u32>,
    pub n_muid: Option<u32>,
}

/// File system statistics (Rstatfs)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatFs {
    pub fstype: u32,
    pub bsize: u32,
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub fsid: u64,
    pub namelen: u32,
}

/// Byte-range lock (Tlock, Tgetlock, Rgetlock)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lock {
    pub lock_type: u8,
    pub flags: Option<u32>,
    pub start: u64,
    pub length: u64,
    pub proc_id: u32,
    pub client_id: String,
}

/// Decoded body of a 9P message
#[derive(Clone, Debug, PartialEq)]
pub enum NinePBody {
    Tversion { msize: u32, version: String },
    Rversion { msize: u32, version: String },
    Tauth { afid: u32, uname: String, aname: String, n_uname: Option<u32> },
    Rauth { aqid: Qid },
    Tattach { fid: u32, afid: u32, uname: String, aname: String, n_uname: Option<u32> },
    Rattach { qid: Qid },
    Rerror { ename: String, errno: Option<u32> },
    Tflush { oldtag: u16 },
    Rflush,
    Twalk { fid: u32, newfid: u32, nwname: u16, wnames: Vec<String> },
    Rwalk { nwqid: u16, qids: Vec<Qid> },
    Topen { fid: u32, mode: u8 },
    Ropen { qid: Qid, iounit: u32 },
    Tcreate { fid: u32, name: String, perm: u32, mode: u8, extension: Option<String> },
    Rcreate { qid: Qid, iounit: u32 },
    Tread { fid: u32, offset: u64, count: u32 },
    Rread { count: u32 },
    Twrite { fid: u32, offset: u64, count: u32 },
    Rwrite { count: u32 },
    Tclunk { fid: u32 },
    Rclunk,
    Tremove { fid: u32 },
    Rremove,
    Tstat { fid: u32 },
    Rstat { stat: Stat },
    Twstat { fid: u32, stat: Stat },
    Rwstat,
    Rlerror { ecode: u32 },
    Tstatfs { fid: u32 },
    Rstatfs { statfs: StatFs },
    Tlopen { fid: u32, flags: u32 },
    Rlopen { qid: Qid, iounit: u32 },
    Tlcreate { fid: u32, name: String, flags: u32, mode: u32, gid: u32 },
    Rlcreate { qid: Qid, iounit: u32 },
    Tsymlink { fid: u32, name: String, symtgt: String, gid: u32 },
    Rsymlink { qid: Qid },
    Tmknod { dfid: u32, name: String, mode: u32, major: u32, minor: u32, gid: u32 },
    Rmknod { qid: Qid },
    Trename { fid: u32, dfid: u32, name: String },
    Rrename,
    Treadlink { fid: u32 },
    Rreadlink { target: String },
    Tgetattr { fid: u32, request_mask: u64 },
    Rgetattr { valid: u64, qid: Qid, mode: u32, size: u64 },
    Tsetattr { fid: u32, valid: u32, mode: u32, size: u64 },
    Rsetattr,
    Txattrwalk { fid: u32, newfid: u32, name: String },
    Rxattrwalk { size: u64 },
    Txattrcreate { fid: u32, name: String, attr_size: u64, flags: u32 },
    Rxattrcreate,
    Treaddir { fid: u32, offset: u64, count: u32 },
    Rreaddir { count: u32 },
    Tfsync { fid: u32 },
    Rfsync,
    Tlock { fid: u32, lock: Lock },
    Rlock { status: u8 },
    Tgetlock { fid: u32, lock: Lock },
    Rgetlock { lock: Lock },
    Tlink { dfid: u32, fid: u32, name: String },
    Rlink,
    Tmkdir { dfid: u32, name: String, mode: u32, gid: u32 },
    Rmkdir { qid: Qid },
    Trenameat { olddirfid: u32, oldname: String, newdirfid: u32, newname: String },
    Rrenameat,
    Tunlinkat { dirfd: u32, name: String, flags: u32 },
    Runlinkat,
    /// Unassigned or illegal type code (including Terror); the body is kept opaque
    Unknown,
}

/// A decoded 9P message header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NinePHeader {
    pub size: u32,
    pub msg_type: NinePMsgType,
    pub tag: u16,
}

/// Parse the fixed header of a 9P message
pub fn parse_header(i: &[u8]) -> DResult<NinePHeader> {
    let (i, size) = le_u32(i)?;
    let (i, msg_type) = le_u8(i)?;
    let (i, tag) = le_u16(i)?;
    let header = NinePHeader {
        size,
        msg_type: NinePMsgType(msg_type),
        tag,
    };
    Ok((i, header))
}

/// Parse a 9P string (`len[2]` followed by `len` bytes)
pub fn parse_string(i: &[u8]) -> DResult<WireStr> {
    let (i, len) = le_u16(i)?;
    let (i, s) = take(len)(i)?;
    Ok((i, WireStr(s)))
}

fn parse_ltime(i: &[u8]) -> DResult<NsTime> {
    map(pair(le_u64, le_u64), |(secs, nsecs)| {
        NsTime::new(secs as i64, nsecs as i32)
    })(i)
}

fn string<'a>(r: &mut ItemParser<'_, 'a>, hf: &'static HeaderField) -> ItemResult<'a, String> {
    r.item(hf, parse_string).map(|s| s.to_string_lossy())
}

fn qid<'a>(r: &mut ItemParser<'_, 'a>, label: &str) -> ItemResult<'a, Qid> {
    let prev = r.open(label);
    let qtype = r.item(&HF_QID_TYPE, le_u8)?;
    let version = r.item(&HF_QID_VERS, le_u32)?;
    let path = r.item(&HF_QID_PATH, le_u64)?;
    r.close(prev);
    Ok(Qid {
        qtype,
        version,
        path,
    })
}

fn stat<'a>(r: &mut ItemParser<'_, 'a>, version: NinePVersion) -> ItemResult<'a, Stat> {
    let prev = r.open("Stat");
    let size = r.item(&HF_STAT_SIZE, le_u16)?;
    let stype = r.item(&HF_STAT_TYPE, le_u16)?;
    let dev = r.item(&HF_STAT_DEV, le_u32)?;
    let qid = qid(r, "Qid")?;
    let mode = r.item(&HF_STAT_MODE, le_u32)?;
    let atime = r.item(&HF_ATIME, le_u32)?;
    let mtime = r.item(&HF_MTIME, le_u32)?;
    let length = r.item(&HF_LENGTH, le_u64)?;
    let name = string(r, &HF_NAME)?;
    let uid = string(r, &HF_UID)?;
    let gid = string(r, &HF_GID)?;
    let muid = string(r, &HF_MUID)?;
    let (extension, n_uid, n_gid, n_muid) = if version == NinePVersion::V2000U {
        (
            Some(string(r, &HF_EXTENSION)?),
            Some(r.item(&HF_N_UID, le_u32)?),
            Some(r.item(&HF_N_GID, le_u32)?),
            Some(r.item(&HF_N_MUID, le_u32)?),
        )
    } else {
        (None, None, None, None)
    };
    r.close(prev);
    Ok(Stat {
        size,
        stype,
        dev,
        qid,
        mode,
        atime,
        mtime,
        length,
        name,
        uid,
        gid,
        muid,
        extension,
        n_uid,
        n_gid,
        n_muid,
    })
}

fn lock<'a>(r: &mut ItemParser<'_, 'a>, with_flags: bool) -> ItemResult<'a, Lock> {
    let lock_type = r.item(&HF_LOCK_TYPE, le_u8)?;
    let flags = if with_flags {
        Some(r.item(&HF_LOCK_FLAGS, le_u32)?)
    } else {
        None
    };
    let start = r.item(&HF_LOCK_START, le_u64)?;
    let length = r.item(&HF_LOCK_LENGTH, le_u64)?;
    let proc_id = r.item(&HF_LOCK_PROC_ID, le_u32)?;
    let client_id = string(r, &HF_LOCK_CLIENT_ID)?;
    Ok(Lock {
        lock_type,
        flags,
        start,
        length,
        proc_id,
        client_id,
    })
}

fn data<'a>(r: &mut ItemParser<'_, 'a>, count: u32) -> ItemResult<'a, ()> {
    r.item(&HF_DATA, take(count))?;
    Ok(())
}

/// Decoded body, and whether a list was cut at [`MAXWELEM`] entries
pub struct DecodedBody {
    pub body: NinePBody,
    pub list_truncated: bool,
}

/// Decode the body of a message of type `msg_type`, adding its fields to the tree
pub fn decode_body<'a>(
    r: &mut ItemParser<'_, 'a>,
    msg_type: NinePMsgType,
    version: NinePVersion,
) -> ItemResult<'a, DecodedBody> {
    let mut list_truncated = false;
    let body = match msg_type {
        NinePMsgType::Tversion | NinePMsgType::Rversion => {
            let msize = r.item(&HF_MSIZE, le_u32)?;
            let version = string(r, &HF_VERSION)?;
            if msg_type == NinePMsgType::Tversion {
                NinePBody::Tversion { msize, version }
            } else {
                NinePBody::Rversion { msize, version }
            }
        }
        NinePMsgType::Tauth => {
            let afid = r.item(&HF_AFID, le_u32)?;
            let uname = string(r, &HF_UNAME)?;
            let aname = string(r, &HF_ANAME)?;
            let n_uname = if version.has_numeric_ids() {
                Some(r.item(&HF_N_UNAME, le_u32)?)
            } else {
                None
            };
            NinePBody::Tauth {
                afid,
                uname,
                aname,
                n_uname,
            }
        }
        NinePMsgType::Rauth => NinePBody::Rauth {
            aqid: qid(r, "Auth Qid")?,
        },
        NinePMsgType::Tattach => {
            let fid = r.item(&HF_FID, le_u32)?;
            let afid = r.item(&HF_AFID, le_u32)?;
            let uname = string(r, &HF_UNAME)?;
            let aname = string(r, &HF_ANAME)?;
            let n_uname = if version.has_numeric_ids() {
                Some(r.item(&HF_N_UNAME, le_u32)?)
            } else {
                None
            };
            NinePBody::Tattach {
                fid,
                afid,
                uname,
                aname,
                n_uname,
            }
        }
        NinePMsgType::Rattach => NinePBody::Rattach {
            qid: qid(r, "Qid")?,
        },
        NinePMsgType::Rerror => {
            let ename = string(r, &HF_ENAME)?;
            let errno = if version == NinePVersion::V2000U {
                Some(r.item(&HF_ERRNO, le_u32)?)
            } else {
                None
            };
            NinePBody::Rerror { ename, errno }
        }
        NinePMsgType::Tflush => NinePBody::Tflush {
            oldtag: r.item(&HF_OLDTAG, le_u16)?,
        },
        NinePMsgType::Rflush => NinePBody::Rflush,
        NinePMsgType::Twalk => {
            let fid = r.item(&HF_FID, le_u32)?;
            let newfid = r.item(&HF_NEWFID, le_u32)?;
            let nwname = r.item(&HF_NWNAME, le_u16)?;
            let shown = usize::from(nwname).min(MAXWELEM);
            list_truncated = usize::from(nwname) > MAXWELEM;
            let mut wnames = Vec::with_capacity(shown);
            for _ in 0..shown {
                wnames.push(string(r, &HF_WNAME)?);
            }
            NinePBody::Twalk {
                fid,
                newfid,
                nwname,
                wnames,
            }
        }
        NinePMsgType::Rwalk => {
            let nwqid = r.item(&HF_NWQID, le_u16)?;
            let shown = usize::from(nwqid).min(MAXWELEM);
            list_truncated = usize::from(nwqid) > MAXWELEM;
            let mut qids = Vec::with_capacity(shown);
            for n in 0..shown {
                qids.push(qid(r, &format!("Qid #{}", n))?);
            }
            NinePBody::Rwalk { nwqid, qids }
        }
        NinePMsgType::Topen => {
            let fid = r.item(&HF_FID, le_u32)?;
            let mode = r.item(&HF_MODE, le_u8)?;
            NinePBody::Topen { fid, mode }
        }
        NinePMsgType::Ropen | NinePMsgType::Rcreate | NinePMsgType::Rlopen | NinePMsgType::Rlcreate => {
            let qid = qid(r, "Qid")?;
            let iounit = r.item(&HF_IOUNIT, le_u32)?;
            match msg_type {
                NinePMsgType::Ropen => NinePBody::Ropen { qid, iounit },
                NinePMsgType::Rcreate => NinePBody::Rcreate { qid, iounit },
                NinePMsgType::Rlopen => NinePBody::Rlopen { qid, iounit },
                _ => NinePBody::Rlcreate { qid, iounit },
            }
        }
        NinePMsgType::Tcreate => {
            let fid = r.item(&HF_FID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let perm = r.item(&HF_PERM, le_u32)?;
            let mode = r.item(&HF_MODE, le_u8)?;
            let extension = if version == NinePVersion::V2000U {
                Some(string(r, &HF_EXTENSION)?)
            } else {
                None
            };
            NinePBody::Tcreate {
                fid,
                name,
                perm,
                mode,
                extension,
            }
        }
        NinePMsgType::Tread | NinePMsgType::Treaddir => {
            let fid = r.item(&HF_FID, le_u32)?;
            let offset = r.item(&HF_OFFSET, le_u64)?;
            let count = r.item(&HF_COUNT, le_u32)?;
            if msg_type == NinePMsgType::Tread {
                NinePBody::Tread { fid, offset, count }
            } else {
                NinePBody::Treaddir { fid, offset, count }
            }
        }
        NinePMsgType::Rread | NinePMsgType::Rreaddir => {
            let count = r.item(&HF_COUNT, le_u32)?;
            data(r, count)?;
            if msg_type == NinePMsgType::Rread {
                NinePBody::Rread { count }
            } else {
                NinePBody::Rreaddir { count }
            }
        }
        NinePMsgType::Twrite => {
            let fid = r.item(&HF_FID, le_u32)?;
            let offset = r.item(&HF_OFFSET, le_u64)?;
            let count = r.item(&HF_COUNT, le_u32)?;
            data(r, count)?;
            NinePBody::Twrite { fid, offset, count }
        }
        NinePMsgType::Rwrite => NinePBody::Rwrite {
            count: r.item(&HF_COUNT, le_u32)?,
        },
        NinePMsgType::Tclunk => NinePBody::Tclunk {
            fid: r.item(&HF_FID, le_u32)?,
        },
        NinePMsgType::Rclunk => NinePBody::Rclunk,
        NinePMsgType::Tremove => NinePBody::Tremove {
            fid: r.item(&HF_FID, le_u32)?,
        },
        NinePMsgType::Rremove => NinePBody::Rremove,
        NinePMsgType::Tstat => NinePBody::Tstat {
            fid: r.item(&HF_FID, le_u32)?,
        },
        NinePMsgType::Rstat => {
            r.item(&HF_NSTAT, le_u16)?;
            NinePBody::Rstat {
                stat: stat(r, version)?,
            }
        }
        NinePMsgType::Twstat => {
            let fid = r.item(&HF_FID, le_u32)?;
            r.item(&HF_NSTAT, le_u16)?;
            NinePBody::Twstat {
                fid,
                stat: stat(r, version)?,
            }
        }
        NinePMsgType::Rwstat => NinePBody::Rwstat,
        NinePMsgType::Rlerror => NinePBody::Rlerror {
            ecode: r.item(&HF_LERROR, le_u32)?,
        },
        NinePMsgType::Tstatfs => NinePBody::Tstatfs {
            fid: r.item(&HF_FID, le_u32)?,
        },
        NinePMsgType::Rstatfs => {
            let prev = r.open("File system statistics");
            let statfs = StatFs {
                fstype: r.item(&HF_STATFS_TYPE, le_u32)?,
                bsize: r.item(&HF_STATFS_BSIZE, le_u32)?,
                blocks: r.item(&HF_STATFS_BLOCKS, le_u64)?,
                bfree: r.item(&HF_STATFS_BFREE, le_u64)?,
                bavail: r.item(&HF_STATFS_BAVAIL, le_u64)?,
                files: r.item(&HF_STATFS_FILES, le_u64)?,
                ffree: r.item(&HF_STATFS_FFREE, le_u64)?,
                fsid: r.item(&HF_STATFS_FSID, le_u64)?,
                namelen: r.item(&HF_STATFS_NAMELEN, le_u32)?,
            };
            r.close(prev);
            NinePBody::Rstatfs { statfs }
        }
        NinePMsgType::Tlopen => {
            let fid = r.item(&HF_FID, le_u32)?;
            let flags = r.item(&HF_LFLAGS, le_u32)?;
            NinePBody::Tlopen { fid, flags }
        }
        NinePMsgType::Tlcreate => {
            let fid = r.item(&HF_FID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let flags = r.item(&HF_LFLAGS, le_u32)?;
            let mode = r.item(&HF_LMODE, le_u32)?;
            let gid = r.item(&HF_LGID, le_u32)?;
            NinePBody::Tlcreate {
                fid,
                name,
                flags,
                mode,
                gid,
            }
        }
        NinePMsgType::Tsymlink => {
            let fid = r.item(&HF_FID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let symtgt = string(r, &HF_SYMTGT)?;
            let gid = r.item(&HF_LGID, le_u32)?;
            NinePBody::Tsymlink {
                fid,
                name,
                symtgt,
                gid,
            }
        }
        NinePMsgType::Rsymlink | NinePMsgType::Rmknod | NinePMsgType::Rmkdir => {
            let qid = qid(r, "Qid")?;
            match msg_type {
                NinePMsgType::Rsymlink => NinePBody::Rsymlink { qid },
                NinePMsgType::Rmknod => NinePBody::Rmknod { qid },
                _ => NinePBody::Rmkdir { qid },
            }
        }
        NinePMsgType::Tmknod => {
            let dfid = r.item(&HF_DFID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let mode = r.item(&HF_LMODE, le_u32)?;
            let major = r.item(&HF_MAJOR, le_u32)?;
            let minor = r.item(&HF_MINOR, le_u32)?;
            let gid = r.item(&HF_LGID, le_u32)?;
            NinePBody::Tmknod {
                dfid,
                name,
                mode,
                major,
                minor,
                gid,
            }
        }
        NinePMsgType::Trename => {
            let fid = r.item(&HF_FID, le_u32)?;
            let dfid = r.item(&HF_DFID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            NinePBody::Trename { fid, dfid, name }
        }
        NinePMsgType::Rrename => NinePBody::Rrename,
        NinePMsgType::Treadlink => NinePBody::Treadlink {
            fid: r.item(&HF_FID, le_u32)?,
        },
        NinePMsgType::Rreadlink => NinePBody::Rreadlink {
            target: string(r, &HF_SYMTGT)?,
        },
        NinePMsgType::Tgetattr => {
            let fid = r.item(&HF_FID, le_u32)?;
            let request_mask = r.item(&HF_GETATTR_MASK, le_u64)?;
            NinePBody::Tgetattr { fid, request_mask }
        }
        NinePMsgType::Rgetattr => {
            let valid = r.item(&HF_GETATTR_VALID, le_u64)?;
            let qid = qid(r, "Qid")?;
            let mode = r.item(&HF_LMODE, le_u32)?;
            r.item(&HF_LUID, le_u32)?;
            r.item(&HF_LGID, le_u32)?;
            r.item(&HF_NLINK, le_u64)?;
            r.item(&HF_RDEV, le_u64)?;
            let size = r.item(&HF_LENGTH, le_u64)?;
            r.item(&HF_BLKSIZE, le_u64)?;
            r.item(&HF_BLOCKS, le_u64)?;
            r.item(&HF_LATIME, parse_ltime)?;
            r.item(&HF_LMTIME, parse_ltime)?;
            r.item(&HF_LCTIME, parse_ltime)?;
            r.item(&HF_LBTIME, parse_ltime)?;
            r.item(&HF_GEN, le_u64)?;
            r.item(&HF_DATA_VERSION, le_u64)?;
            NinePBody::Rgetattr {
                valid,
                qid,
                mode,
                size,
            }
        }
        NinePMsgType::Tsetattr => {
            let fid = r.item(&HF_FID, le_u32)?;
            let valid = r.item(&HF_SETATTR_VALID, le_u32)?;
            let mode = r.item(&HF_LMODE, le_u32)?;
            r.item(&HF_LUID, le_u32)?;
            r.item(&HF_LGID, le_u32)?;
            let size = r.item(&HF_LENGTH, le_u64)?;
            r.item(&HF_LATIME, parse_ltime)?;
            r.item(&HF_LMTIME, parse_ltime)?;
            NinePBody::Tsetattr {
                fid,
                valid,
                mode,
                size,
            }
        }
        NinePMsgType::Rsetattr => NinePBody::Rsetattr,
        NinePMsgType::Txattrwalk => {
            let fid = r.item(&HF_FID, le_u32)?;
            let newfid = r.item(&HF_NEWFID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            NinePBody::Txattrwalk { fid, newfid, name }
        }
        NinePMsgType::Rxattrwalk => NinePBody::Rxattrwalk {
            size: r.item(&HF_XATTR_SIZE, le_u64)?,
        },
        NinePMsgType::Txattrcreate => {
            let fid = r.item(&HF_FID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let attr_size = r.item(&HF_XATTR_SIZE, le_u64)?;
            let flags = r.item(&HF_XATTR_FLAGS, le_u32)?;
            NinePBody::Txattrcreate {
                fid,
                name,
                attr_size,
                flags,
            }
        }
        NinePMsgType::Rxattrcreate => NinePBody::Rxattrcreate,
        NinePMsgType::Tfsync => {
            let fid = r.item(&HF_FID, le_u32)?;
            // older clients do not send the datasync flag
            if r.rest.len() >= 4 {
                r.item(&HF_DATASYNC, le_u32)?;
            }
            NinePBody::Tfsync { fid }
        }
        NinePMsgType::Rfsync => NinePBody::Rfsync,
        NinePMsgType::Tlock => {
            let fid = r.item(&HF_FID, le_u32)?;
            NinePBody::Tlock {
                fid,
                lock: lock(r, true)?,
            }
        }
        NinePMsgType::Rlock => NinePBody::Rlock {
            status: r.item(&HF_LOCK_STATUS, le_u8)?,
        },
        NinePMsgType::Tgetlock => {
            let fid = r.item(&HF_FID, le_u32)?;
            NinePBody::Tgetlock {
                fid,
                lock: lock(r, false)?,
            }
        }
        NinePMsgType::Rgetlock => NinePBody::Rgetlock {
            lock: lock(r, false)?,
        },
        NinePMsgType::Tlink => {
            let dfid = r.item(&HF_DFID, le_u32)?;
            let fid = r.item(&HF_FID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            NinePBody::Tlink { dfid, fid, name }
        }
        NinePMsgType::Rlink => NinePBody::Rlink,
        NinePMsgType::Tmkdir => {
            let dfid = r.item(&HF_DFID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let mode = r.item(&HF_LMODE, le_u32)?;
            let gid = r.item(&HF_LGID, le_u32)?;
            NinePBody::Tmkdir {
                dfid,
                name,
                mode,
                gid,
            }
        }
        NinePMsgType::Trenameat => {
            let olddirfid = r.item(&HF_DFID, le_u32)?;
            let oldname = string(r, &HF_NAME)?;
            let newdirfid = r.item(&HF_NEWDIRFID, le_u32)?;
            let newname = string(r, &HF_NEWNAME)?;
            NinePBody::Trenameat {
                olddirfid,
                oldname,
                newdirfid,
                newname,
            }
        }
        NinePMsgType::Rrenameat => NinePBody::Rrenameat,
        NinePMsgType::Tunlinkat => {
            let dirfd = r.item(&HF_DFID, le_u32)?;
            let name = string(r, &HF_NAME)?;
            let flags = r.item(&HF_UNLINKAT_FLAGS, le_u32)?;
            NinePBody::Tunlinkat { dirfd, name, flags }
        }
        NinePMsgType::Runlinkat => NinePBody::Runlinkat,
        _ => NinePBody::Unknown,
    };
    Ok(DecodedBody {
        body,
        list_truncated,
    })
}

impl NinePBody {
    /// The fid a request operates on, if any
    pub fn fid(&self) -> Option<u32> {
        use NinePBody::*;
        match self {
            Tattach { fid, .. }
            | Twalk { fid, .. }
            | Topen { fid, .. }
            | Tcreate { fid, .. }
            | Tread { fid, .. }
            | Twrite { fid, .. }
            | Tclunk { fid }
            | Tremove { fid }
            | Tstat { fid }
            | Twstat { fid, .. }
            | Tstatfs { fid }
            | Tlopen { fid, .. }
            | Tlcreate { fid, .. }
            | Tsymlink { fid, .. }
            | Trename { fid, .. }
            | Treadlink { fid }
            | Tgetattr { fid, .. }
            | Tsetattr { fid, .. }
            | Txattrwalk { fid, .. }
            | Txattrcreate { fid, .. }
            | Treaddir { fid, .. }
            | Tfsync { fid }
            | Tlock { fid, .. }
            | Tgetlock { fid, .. }
            | Tlink { fid, .. } => Some(*fid),
            Tmknod { dfid, .. } | Tmkdir { dfid, .. } => Some(*dfid),
            Trenameat { olddirfid, .. } => Some(*olddirfid),
            Tunlinkat { dirfd, .. } => Some(*dirfd),
            Tauth { afid, .. } => Some(*afid),
            _ => None,
        }
    }

    /// Append the summary of the body to the Info text
    pub fn write_summary(&self, out: &mut String) {
        use NinePBody::*;
        let _ = match self {
            Tversion { msize, version } | Rversion { msize, version } => {
                write!(out, " Msize={} Version={}", msize, version)
            }
            Tauth { afid, uname, aname, .. } => {
                write!(out, " Afid={} Uname={} Aname={}", afid, uname, aname)
            }
            Tattach {
                fid, uname, aname, ..
            } => write!(out, " Fid={} Uname={} Aname={}", fid, uname, aname),
            Rerror { ename, .. } => write!(out, " Ename={}", ename),
            Rlerror { ecode } => write!(out, " Ecode={}", ecode),
            Tflush { oldtag } => write!(out, " Oldtag={}", oldtag),
            Twalk {
                fid,
                newfid,
                nwname,
                wnames,
            } => {
                let _ = write!(out, " Fid={} Newfid={} Nwname={}", fid, newfid, nwname);
                if wnames.is_empty() {
                    Ok(())
                } else {
                    write!(out, " ({})", wnames.join("/"))
                }
            }
            Rwalk { nwqid, .. } => write!(out, " Nwqid={}", nwqid),
            Topen { fid, mode } => write!(out, " Fid={} Mode=0x{:02x}", fid, mode),
            Tcreate { fid, name, .. } | Tlcreate { fid, name, .. } => {
                write!(out, " Fid={} Name={}", fid, name)
            }
            Tread { fid, offset, count }
            | Twrite { fid, offset, count }
            | Treaddir { fid, offset, count } => {
                write!(out, " Fid={} Offset={} Count={}", fid, offset, count)
            }
            Rread { count } | Rwrite { count } | Rreaddir { count } => {
                write!(out, " Count={}", count)
            }
            Ropen { iounit, .. } | Rcreate { iounit, .. } | Rlopen { iounit, .. } | Rlcreate { iounit, .. } => {
                write!(out, " Iounit={}", iounit)
            }
            Rstat { stat } => write!(out, " Name={}", stat.name),
            Twstat { fid, stat } => write!(out, " Fid={} Name={}", fid, stat.name),
            Tsymlink { fid, name, symtgt, .. } => {
                write!(out, " Fid={} Name={} Target={}", fid, name, symtgt)
            }
            Tmknod { dfid, name, .. } | Tmkdir { dfid, name, .. } => {
                write!(out, " Dfid={} Name={}", dfid, name)
            }
            Trename { fid, dfid, name } => write!(out, " Fid={} Dfid={} Name={}", fid, dfid, name),
            Rreadlink { target } => write!(out, " Target={}", target),
            Txattrwalk { fid, newfid, name } => {
                write!(out, " Fid={} Newfid={} Name={}", fid, newfid, name)
            }
            Txattrcreate { fid, name, .. } => write!(out, " Fid={} Name={}", fid, name),
            Tlink { dfid, fid, name } => write!(out, " Dfid={} Fid={} Name={}", dfid, fid, name),
            Trenameat {
                oldname, newname, ..
            } => write!(out, " Oldname={} Newname={}", oldname, newname),
            Tunlinkat { dirfd, name, .. } => write!(out, " Dirfd={} Name={}", dirfd, name),
            Rlock { status } => write!(out, " Status={}", status),
            other => match other.fid() {
                Some(fid) => write!(out, " Fid={}", fid),
                None => Ok(()),
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeId, ProtoTree};
    use hex_literal::hex;

    #[test]
    fn header_and_names() {
        let data = hex!("13 00 00 00 6e 01 00");
        let (rem, h) = parse_header(&data).expect("header");
        assert!(rem.is_empty());
        assert_eq!(h.size, 19);
        assert_eq!(h.msg_type, NinePMsgType::Twalk);
        assert_eq!(h.msg_type.name(), Some("Twalk"));
        assert!(h.msg_type.is_request());
        assert_eq!(NinePMsgType(200).name(), None);
    }

    #[test]
    fn decode_twalk() {
        // fid=5 newfid=6 nwname=2 "a" "bc"
        let data = hex!("05 00 00 00 06 00 00 00 02 00 01 00 61 02 00 62 63");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        let d = decode_body(&mut r, NinePMsgType::Twalk, NinePVersion::V2000).expect("body");
        assert!(r.rest.is_empty());
        assert!(!d.list_truncated);
        assert_eq!(
            d.body,
            NinePBody::Twalk {
                fid: 5,
                newfid: 6,
                nwname: 2,
                wnames: vec!["a".to_owned(), "bc".to_owned()],
            }
        );
        assert_eq!(tree.last("9p.wname").map(|n| n.range.clone()), Some(13..17));
    }

    #[test]
    fn attach_depends_on_version() {
        let data = hex!("01 00 00 00 ff ff ff ff 00 00 02 00 2f 78 e8 03 00 00");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        let d = decode_body(&mut r, NinePMsgType::Tattach, NinePVersion::V2000U).expect("body");
        assert!(r.rest.is_empty());
        match d.body {
            NinePBody::Tattach { aname, n_uname, .. } => {
                assert_eq!(aname, "/x");
                assert_eq!(n_uname, Some(1000));
            }
            b => panic!("unexpected body {:?}", b),
        }
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        decode_body(&mut r, NinePMsgType::Tattach, NinePVersion::V2000).expect("body");
        assert_eq!(r.rest.len(), 4);
    }

    #[test]
    fn illegal_type_is_unknown() {
        let data = hex!("00 01");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        let d = decode_body(&mut r, NinePMsgType::Terror, NinePVersion::V2000).expect("body");
        assert_eq!(d.body, NinePBody::Unknown);
        assert_eq!(r.rest.len(), 2);
    }
}
