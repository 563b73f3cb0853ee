// DNS message encoding and decoding
//
// Builds recursive TXT queries and parses responses, including
// compressed names in the answer section.

use super::{DnsError, Result};
use bytes::{Buf, BufMut, BytesMut};
use std::fmt;
use std::io::Cursor;

/// Resource record type for TXT
pub const TYPE_TXT: u16 = 16;

/// Internet class
pub const CLASS_IN: u16 = 1;

/// Longest encoded domain name (RFC 1035 section 2.3.4)
const MAX_NAME_LEN: usize = 255;

/// Longest single label
const MAX_LABEL_LEN: usize = 63;

/// Longest TXT character-string
const MAX_CHARACTER_STRING: usize = 255;

/// Bound on compression pointer chains
const MAX_POINTER_HOPS: usize = 32;

const FLAG_RESPONSE: u16 = 0x8000;
const FLAG_TRUNCATED: u16 = 0x0200;
const FLAG_RECURSION_DESIRED: u16 = 0x0100;
const FLAG_RECURSION_AVAILABLE: u16 = 0x0080;

/// DNS message header (12 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,              // Transaction ID
    pub flags: u16,           // Flags
    pub qdcount: u16,         // Question count
    pub ancount: u16,         // Answer count
    pub nscount: u16,         // Authority count
    pub arcount: u16,         // Additional count
}

impl DnsHeader {
    /// Create a new query header
    pub fn new_query(id: u16) -> Self {
        Self {
            id,
            flags: FLAG_RECURSION_DESIRED,
            qdcount: 1,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }

    /// Parse header from bytes
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Self> {
        if buf.remaining() < 12 {
            return Err(DnsError::Truncated("header"));
        }

        Ok(Self {
            id: buf.get_u16(),
            flags: buf.get_u16(),
            qdcount: buf.get_u16(),
            ancount: buf.get_u16(),
            nscount: buf.get_u16(),
            arcount: buf.get_u16(),
        })
    }

    /// Write header to buffer
    pub fn write(&self, buf: &mut BytesMut) {
        buf.put_u16(self.id);
        buf.put_u16(self.flags);
        buf.put_u16(self.qdcount);
        buf.put_u16(self.ancount);
        buf.put_u16(self.nscount);
        buf.put_u16(self.arcount);
    }

    /// Check if this is a response
    pub fn is_response(&self) -> bool {
        (self.flags & FLAG_RESPONSE) != 0
    }

    /// Check if the server truncated the answer (TC bit)
    pub fn is_truncated(&self) -> bool {
        (self.flags & FLAG_TRUNCATED) != 0
    }

    /// Response code carried in the low four flag bits
    pub fn rcode(&self) -> Rcode {
        Rcode::from((self.flags & 0x000F) as u8)
    }
}

/// DNS response code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl From<u8> for Rcode {
    fn from(value: u8) -> Self {
        match value {
            0 => Rcode::NoError,
            1 => Rcode::FormErr,
            2 => Rcode::ServFail,
            3 => Rcode::NxDomain,
            4 => Rcode::NotImp,
            5 => Rcode::Refused,
            other => Rcode::Other(other),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(rcode: Rcode) -> Self {
        match rcode {
            Rcode::NoError => 0,
            Rcode::FormErr => 1,
            Rcode::ServFail => 2,
            Rcode::NxDomain => 3,
            Rcode::NotImp => 4,
            Rcode::Refused => 5,
            Rcode::Other(value) => value & 0x0F,
        }
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rcode::NoError => write!(f, "NOERROR"),
            Rcode::FormErr => write!(f, "FORMERR"),
            Rcode::ServFail => write!(f, "SERVFAIL"),
            Rcode::NxDomain => write!(f, "NXDOMAIN"),
            Rcode::NotImp => write!(f, "NOTIMP"),
            Rcode::Refused => write!(f, "REFUSED"),
            Rcode::Other(value) => write!(f, "RCODE{}", value),
        }
    }
}

/// DNS question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub qname: String,
    pub qtype: u16,
    pub qclass: u16,
}

impl DnsQuestion {
    /// Create a new TXT question
    pub fn new_txt(domain: &str) -> Self {
        Self {
            qname: domain.to_string(),
            qtype: TYPE_TXT,
            qclass: CLASS_IN,
        }
    }

    /// Parse question from bytes
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Self> {
        let qname = read_domain_name(buf)?;

        if buf.remaining() < 4 {
            return Err(DnsError::Truncated("question"));
        }

        let qtype = buf.get_u16();
        let qclass = buf.get_u16();

        Ok(Self { qname, qtype, qclass })
    }

    /// Write question to buffer
    pub fn write(&self, buf: &mut BytesMut) -> Result<()> {
        write_domain_name(&self.qname, buf)?;
        buf.put_u16(self.qtype);
        buf.put_u16(self.qclass);
        Ok(())
    }
}

/// DNS resource record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: String,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl DnsRecord {
    /// Create a TXT record carrying `text`, split into as many
    /// character-strings as needed
    pub fn new_txt(domain: &str, text: &[u8], ttl: u32) -> Self {
        let mut rdata = Vec::with_capacity(text.len() + text.len() / MAX_CHARACTER_STRING + 1);

        if text.is_empty() {
            rdata.push(0);
        }
        for chunk in text.chunks(MAX_CHARACTER_STRING) {
            rdata.push(chunk.len() as u8);
            rdata.extend_from_slice(chunk);
        }

        Self {
            name: domain.to_string(),
            rtype: TYPE_TXT,
            rclass: CLASS_IN,
            ttl,
            rdata,
        }
    }

    /// Parse record from bytes
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Self> {
        let name = read_domain_name(buf)?;

        if buf.remaining() < 10 {
            return Err(DnsError::Truncated("record header"));
        }

        let rtype = buf.get_u16();
        let rclass = buf.get_u16();
        let ttl = buf.get_u32();
        let rdlen = buf.get_u16() as usize;

        if buf.remaining() < rdlen {
            return Err(DnsError::Truncated("record data"));
        }

        let mut rdata = vec![0u8; rdlen];
        buf.copy_to_slice(&mut rdata);

        Ok(Self { name, rtype, rclass, ttl, rdata })
    }

    /// Write record to buffer
    pub fn write(&self, buf: &mut BytesMut) -> Result<()> {
        if self.rdata.len() > u16::MAX as usize {
            return Err(DnsError::InvalidMessage(format!(
                "record data too long: {} bytes",
                self.rdata.len()
            )));
        }

        write_domain_name(&self.name, buf)?;
        buf.put_u16(self.rtype);
        buf.put_u16(self.rclass);
        buf.put_u32(self.ttl);
        buf.put_u16(self.rdata.len() as u16);
        buf.put_slice(&self.rdata);
        Ok(())
    }

    /// Check if this is an IN TXT record
    pub fn is_txt(&self) -> bool {
        self.rtype == TYPE_TXT && self.rclass == CLASS_IN
    }

    /// The record's character-strings, in wire order
    pub fn txt_strings(&self) -> Result<Vec<&[u8]>> {
        if self.rtype != TYPE_TXT {
            return Err(DnsError::InvalidMessage("not a TXT record".into()));
        }

        let mut strings = Vec::new();
        let mut rest = &self.rdata[..];

        while let Some((&len, tail)) = rest.split_first() {
            let len = len as usize;
            if tail.len() < len {
                return Err(DnsError::Truncated("TXT character-string"));
            }
            let (string, tail) = tail.split_at(len);
            strings.push(string);
            rest = tail;
        }

        Ok(strings)
    }

    /// The record's character-strings joined into one string
    pub fn txt_text(&self) -> Result<String> {
        let joined = self.txt_strings()?.concat();
        Ok(String::from_utf8_lossy(&joined).into_owned())
    }
}

/// DNS message (complete query or response)
#[derive(Debug, Clone)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
}

impl DnsMessage {
    /// Create a new recursive TXT query
    pub fn new_query(domain: &str, id: u16) -> Self {
        Self {
            header: DnsHeader::new_query(id),
            questions: vec![DnsQuestion::new_txt(domain)],
            answers: Vec::new(),
        }
    }

    /// Create an empty response mirroring `query`'s id and question
    pub fn response_to(query: &DnsMessage, rcode: Rcode) -> Self {
        let flags = FLAG_RESPONSE
            | (query.header.flags & FLAG_RECURSION_DESIRED)
            | FLAG_RECURSION_AVAILABLE
            | u8::from(rcode) as u16;

        Self {
            header: DnsHeader {
                id: query.header.id,
                flags,
                qdcount: query.questions.len() as u16,
                ancount: 0,
                nscount: 0,
                arcount: 0,
            },
            questions: query.questions.clone(),
            answers: Vec::new(),
        }
    }

    /// Create a TXT response carrying one record per entry of `texts`
    pub fn new_txt_response<S: AsRef<[u8]>>(query: &DnsMessage, texts: &[S], ttl: u32) -> Self {
        let mut response = Self::response_to(query, Rcode::NoError);
        let name = query
            .questions
            .first()
            .map(|q| q.qname.clone())
            .unwrap_or_default();

        for text in texts {
            response.answers.push(DnsRecord::new_txt(&name, text.as_ref(), ttl));
        }
        response
    }

    /// Set or clear the TC bit
    pub fn set_truncated(&mut self, truncated: bool) {
        if truncated {
            self.header.flags |= FLAG_TRUNCATED;
        } else {
            self.header.flags &= !FLAG_TRUNCATED;
        }
    }

    /// Parse DNS message from bytes
    ///
    /// Authority and additional sections are not decoded.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let header = DnsHeader::parse(&mut cursor)?;

        let mut questions = Vec::with_capacity(header.qdcount.min(4) as usize);
        for _ in 0..header.qdcount {
            questions.push(DnsQuestion::parse(&mut cursor)?);
        }

        let mut answers = Vec::with_capacity(header.ancount.min(64) as usize);
        for _ in 0..header.ancount {
            answers.push(DnsRecord::parse(&mut cursor)?);
        }

        Ok(Self { header, questions, answers })
    }

    /// Serialize DNS message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(512);

        let mut header = self.header.clone();
        header.qdcount = self.questions.len() as u16;
        header.ancount = self.answers.len() as u16;
        header.write(&mut buf);

        for q in &self.questions {
            q.write(&mut buf)?;
        }

        for a in &self.answers {
            a.write(&mut buf)?;
        }

        Ok(buf.to_vec())
    }

    /// Get the domain name from the first question
    pub fn question_domain(&self) -> Result<&str> {
        self.questions
            .first()
            .map(|q| q.qname.as_str())
            .ok_or_else(|| DnsError::InvalidMessage("No questions in message".into()))
    }

    /// Text of every IN TXT answer, one string per record
    pub fn txt_answers(&self) -> Result<Vec<String>> {
        self.answers
            .iter()
            .filter(|record| record.is_txt())
            .map(DnsRecord::txt_text)
            .collect()
    }
}

/// Read a domain name, following compression pointers
fn read_domain_name(buf: &mut Cursor<&[u8]>) -> Result<String> {
    let data: &[u8] = *buf.get_ref();
    let mut pos = buf.position() as usize;
    let mut labels = Vec::new();
    let mut encoded_len = 0usize;
    let mut hops = 0usize;
    let mut resume_at = None;

    loop {
        let len = *data.get(pos).ok_or(DnsError::Truncated("domain name"))? as usize;

        match len & 0xC0 {
            0xC0 => {
                let low = *data.get(pos + 1).ok_or(DnsError::Truncated("compression pointer"))? as usize;
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(DnsError::InvalidMessage("compression pointer loop".into()));
                }
                pos = ((len & 0x3F) << 8) | low;
            }
            0x00 => {
                pos += 1;
                if len == 0 {
                    break;
                }

                let label = data.get(pos..pos + len).ok_or(DnsError::Truncated("label"))?;
                encoded_len += len + 1;
                if encoded_len + 1 > MAX_NAME_LEN {
                    return Err(DnsError::NameTooLong(encoded_len + 1));
                }

                labels.push(String::from_utf8_lossy(label).into_owned());
                pos += len;
            }
            _ => return Err(DnsError::InvalidMessage("reserved label type".into())),
        }
    }

    buf.set_position(resume_at.unwrap_or(pos) as u64);
    Ok(labels.join("."))
}

/// Write a domain name to DNS message
fn write_domain_name(domain: &str, buf: &mut BytesMut) -> Result<()> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let mut encoded_len = 1;

    if !domain.is_empty() {
        for label in domain.split('.') {
            let bytes = label.as_bytes();
            if bytes.is_empty() {
                return Err(DnsError::InvalidMessage(format!("empty label in {:?}", domain)));
            }
            if bytes.len() > MAX_LABEL_LEN {
                return Err(DnsError::LabelTooLong(bytes.len()));
            }
            encoded_len += bytes.len() + 1;
            if encoded_len > MAX_NAME_LEN {
                return Err(DnsError::NameTooLong(encoded_len));
            }
            buf.put_u8(bytes.len() as u8);
            buf.put_slice(bytes);
        }
    }
    buf.put_u8(0); // End of name
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_query_construction() {
        let msg = DnsMessage::new_query("fqdn.example.org", 0x1234);
        let bytes = msg.to_bytes().unwrap();

        assert!(bytes.len() > 12);
        assert_eq!(&bytes[0..2], &[0x12, 0x34]); // Transaction ID
        assert_eq!(&bytes[2..4], &[0x01, 0x00]); // RD
        assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0x10, 0x00, 0x01]);
    }

    #[test]
    fn test_txt_response_round_trip() {
        let query = DnsMessage::new_query("fqdn.example.org", 0xBEEF);
        let lines = vec!["00:header.", "01:payload", "02:.signat", "03:ure"];
        let response = DnsMessage::new_txt_response(&query, &lines, 60);
        let bytes = response.to_bytes().unwrap();

        let parsed = DnsMessage::parse(&bytes).unwrap();
        assert_eq!(parsed.header.id, 0xBEEF);
        assert!(parsed.header.is_response());
        assert!(!parsed.header.is_truncated());
        assert_eq!(parsed.header.rcode(), Rcode::NoError);
        assert_eq!(parsed.question_domain().unwrap(), "fqdn.example.org");
        assert_eq!(parsed.txt_answers().unwrap(), lines);
    }

    #[test]
    fn test_long_txt_splits_into_character_strings() {
        let text = vec![b'a'; 300];
        let record = DnsRecord::new_txt("example.com", &text, 300);

        let strings = record.txt_strings().unwrap();
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].len(), 255);
        assert_eq!(strings[1].len(), 45);
        assert_eq!(record.txt_text().unwrap().len(), 300);
    }

    #[test]
    fn test_empty_txt_record() {
        let record = DnsRecord::new_txt("example.com", b"", 300);
        assert_eq!(record.rdata, vec![0]);
        assert_eq!(record.txt_text().unwrap(), "");
    }

    #[test]
    fn test_truncated_character_string() {
        let mut record = DnsRecord::new_txt("example.com", b"abc", 300);
        record.rdata = vec![5, b'a', b'b'];
        assert!(record.txt_strings().is_err());
    }

    #[test]
    fn test_compressed_answer_name() {
        let query = DnsMessage::new_query("example.com", 7);
        let mut bytes = DnsMessage::response_to(&query, Rcode::NoError).to_bytes().unwrap();
        // ancount = 1
        bytes[7] = 1;
        // name: pointer to the question name at offset 12
        bytes.extend_from_slice(&[0xC0, 0x0C]);
        bytes.extend_from_slice(&[0x00, 0x10, 0x00, 0x01]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3C]);
        bytes.extend_from_slice(&[0x00, 0x04, 0x03, b'0', b'0', b':']);

        let parsed = DnsMessage::parse(&bytes).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].name, "example.com");
        assert_eq!(parsed.txt_answers().unwrap(), vec!["00:".to_string()]);
    }

    #[test]
    fn test_pointer_loop_rejected() {
        let mut bytes = vec![0u8; 12];
        bytes[5] = 1; // qdcount = 1
        bytes.extend_from_slice(&[0xC0, 0x0C]);
        bytes.extend_from_slice(&[0x00, 0x10, 0x00, 0x01]);

        assert!(DnsMessage::parse(&bytes).is_err());
    }

    #[test]
    fn test_rcode_and_truncation_flags() {
        let query = DnsMessage::new_query("missing.example.com", 1);
        let mut response = DnsMessage::response_to(&query, Rcode::NxDomain);
        response.set_truncated(true);

        let parsed = DnsMessage::parse(&response.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.header.rcode(), Rcode::NxDomain);
        assert!(parsed.header.is_truncated());
    }

    #[test]
    fn test_domain_name_encoding() {
        let mut buf = BytesMut::new();
        write_domain_name("example.com.", &mut buf).unwrap();

        let mut cursor = Cursor::new(&buf[..]);
        let domain = read_domain_name(&mut cursor).unwrap();

        assert_eq!(domain, "example.com");
        assert_eq!(cursor.position() as usize, buf.len());
    }

    #[test]
    fn test_label_too_long() {
        let mut buf = BytesMut::new();
        let label = "a".repeat(64);
        assert!(matches!(
            write_domain_name(&format!("{}.com", label), &mut buf),
            Err(DnsError::LabelTooLong(64))
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            DnsMessage::parse(&[0u8; 5]),
            Err(DnsError::Truncated("header"))
        ));
    }
}
