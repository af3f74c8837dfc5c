use std::fs::OpenOptions;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use rand::{TryRngCore, rngs::OsRng};
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, Ia5String, KeyPair,
    KeyUsagePurpose, SanType, SerialNumber,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::AuthError;

const SERIAL_BYTES: usize = 16;
const VALIDITY_DAYS: i64 = 365;
const ORGANIZATION: &str = "slack-auth loopback";

pub const CERT_FILE_NAME: &str = "cert.pem";
pub const KEY_FILE_NAME: &str = "key.pem";

pub struct KeyMaterial {
    hosts: Vec<String>,
    serial: Vec<u8>,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
    certificate_pem: String,
    certificate_der: Vec<u8>,
    private_key_pem: String,
}

impl KeyMaterial {
    pub fn provision(host: &str) -> Result<Self, AuthError> {
        let serial = random_serial()?;
        let not_before = OffsetDateTime::now_utc();
        let params = certificate_params(host, &serial, not_before)?;
        let not_after = params.not_after;

        let key_pair = KeyPair::generate().map_err(AuthError::certificate)?;
        let certificate = params
            .self_signed(&key_pair)
            .map_err(AuthError::certificate)?;

        info!(host, "provisioned self-signed loopback certificate");

        Ok(Self {
            hosts: split_hosts(host),
            serial,
            not_before,
            not_after,
            certificate_pem: certificate.pem(),
            certificate_der: certificate.der().to_vec(),
            private_key_pem: key_pair.serialize_pem(),
        })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    pub fn write_pem_files(&self, dir: &Path) -> Result<(PathBuf, PathBuf), AuthError> {
        let cert_path = dir.join(CERT_FILE_NAME);
        let key_path = dir.join(KEY_FILE_NAME);

        std::fs::write(&cert_path, self.certificate_pem.as_bytes())?;
        write_owner_only(&key_path, self.private_key_pem.as_bytes())?;

        debug!(cert = %cert_path.display(), key = %key_path.display(), "wrote key material");
        Ok((cert_path, key_path))
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("hosts", &self.hosts)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

pub(crate) fn certificate_params(
    host: &str,
    serial: &[u8],
    not_before: OffsetDateTime,
) -> Result<CertificateParams, AuthError> {
    let mut params = CertificateParams::default();

    let mut name = DistinguishedName::new();
    name.push(DnType::OrganizationName, ORGANIZATION);
    params.distinguished_name = name;

    params.serial_number = Some(SerialNumber::from(serial.to_vec()));
    params.not_before = not_before;
    params.not_after = not_before + Duration::days(VALIDITY_DAYS);

    // ECDSA keys only need DigitalSignature; KeyEncipherment belongs to RSA key exchange.
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

    params.subject_alt_names = split_hosts(host)
        .into_iter()
        .map(|host| match host.parse::<IpAddr>() {
            Ok(ip) => Ok(SanType::IpAddress(ip)),
            Err(_) => Ia5String::try_from(host)
                .map(SanType::DnsName)
                .map_err(AuthError::certificate),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if params.subject_alt_names.is_empty() {
        return Err(AuthError::Certificate {
            message: "no host names given for the certificate".to_string(),
        });
    }

    Ok(params)
}

fn split_hosts(host: &str) -> Vec<String> {
    host.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

fn random_serial() -> Result<Vec<u8>, AuthError> {
    let mut bytes = [0u8; SERIAL_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::OsRng {
            message: err.to_string(),
        })?;
    // keep the DER INTEGER positive
    bytes[0] &= 0x7f;
    Ok(bytes.to_vec())
}

pub(crate) fn write_owner_only(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)
}

#[cfg(test)]
mod tests {
    use rustls::pki_types::CertificateDer;

    use super::*;

    fn san_strings(params: &CertificateParams) -> (Vec<String>, Vec<String>) {
        let mut ips = Vec::new();
        let mut dns = Vec::new();
        for san in &params.subject_alt_names {
            match san {
                SanType::IpAddress(ip) => ips.push(ip.to_string()),
                SanType::DnsName(name) => dns.push(name.as_str().to_string()),
                other => panic!("unexpected san {other:?}"),
            }
        }
        (ips, dns)
    }

    #[test]
    fn sans_partition_into_ip_and_dns_names() {
        let params = certificate_params(
            "localhost,127.0.0.1,::1,example.test",
            &[1; SERIAL_BYTES],
            OffsetDateTime::now_utc(),
        )
        .unwrap();

        let (ips, dns) = san_strings(&params);
        assert_eq!(ips, vec!["127.0.0.1", "::1"]);
        assert_eq!(dns, vec!["localhost", "example.test"]);
    }

    #[test]
    fn validity_spans_one_year_with_server_auth() {
        let now = OffsetDateTime::now_utc();
        let params = certificate_params("localhost", &[1; SERIAL_BYTES], now).unwrap();

        assert_eq!(params.not_before, now);
        assert_eq!(params.not_after - params.not_before, Duration::days(365));
        assert_eq!(
            params.extended_key_usages,
            vec![ExtendedKeyUsagePurpose::ServerAuth]
        );
        assert_eq!(params.key_usages, vec![KeyUsagePurpose::DigitalSignature]);
    }

    #[test]
    fn empty_host_list_is_rejected() {
        let result = certificate_params(" , ", &[1; SERIAL_BYTES], OffsetDateTime::now_utc());
        assert!(matches!(result, Err(AuthError::Certificate { .. })));
    }

    #[test]
    fn serials_are_random_and_positive() {
        let a = random_serial().unwrap();
        let b = random_serial().unwrap();
        assert_eq!(a.len(), SERIAL_BYTES);
        assert!(a[0] & 0x80 == 0);
        assert_ne!(a, b);
    }

    #[test]
    fn provision_produces_pem_material() {
        let material = KeyMaterial::provision("localhost").unwrap();
        assert!(
            material
                .certificate_pem()
                .starts_with("-----BEGIN CERTIFICATE-----")
        );
        assert!(material.private_key_pem().contains("PRIVATE KEY"));
        assert_eq!(material.hosts(), ["localhost".to_string()]);
        assert_eq!(
            material.not_after() - material.not_before(),
            Duration::days(365)
        );
    }

    #[test]
    fn provisioned_certificate_carries_partitioned_sans() {
        let material = KeyMaterial::provision("localhost,127.0.0.1,::1,example.test").unwrap();
        let der = CertificateDer::from(material.certificate_der().to_vec());
        let parsed = CertificateParams::from_ca_cert_der(&der).unwrap();

        let (ips, dns) = san_strings(&parsed);
        assert_eq!(ips, vec!["127.0.0.1", "::1"]);
        assert_eq!(dns, vec!["localhost", "example.test"]);
    }

    #[test]
    fn writes_pem_files() {
        let dir = tempfile::tempdir().unwrap();
        let material = KeyMaterial::provision("localhost,127.0.0.1").unwrap();
        let (cert_path, key_path) = material.write_pem_files(dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(cert_path).unwrap(),
            material.certificate_pem()
        );
        assert_eq!(
            std::fs::read_to_string(&key_path).unwrap(),
            material.private_key_pem()
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
