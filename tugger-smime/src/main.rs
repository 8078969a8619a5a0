// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::{anyhow, Context, Result},
    clap::{Arg, ArgMatches, Command},
    log::{info, LevelFilter},
    std::{
        io::{Read, Write},
        path::{Path, PathBuf},
        str::FromStr,
        time::Duration,
    },
    tugger_smime::{SmimeFormat, SmimeSign, SmimeVerification, SmimeVerify},
};

const SIGN_ABOUT: &str = "\
Produce an S/MIME signature over some content.

The content is read from the given path, or from stdin if the path is `-`.
The signature is written to --output, or to stdout if not given.

Signing is performed by `openssl smime -sign -binary`. The signature is
detached from the content.
";

const VERIFY_ABOUT: &str = "\
Verify a detached S/MIME signature.

The signer certificate is used as the trust anchor. The process exits 0
if and only if the signature verifies.
";

/// Resolve a path given on the command line against the current directory.
fn absolute_path(value: &str) -> Result<PathBuf> {
    let path = Path::new(value);

    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("resolving current directory")?
            .join(path))
    }
}

fn required_path(args: &ArgMatches, name: &str) -> Result<PathBuf> {
    absolute_path(
        args.value_of(name)
            .ok_or_else(|| anyhow!("missing argument {}", name))?,
    )
}

fn optional_path(args: &ArgMatches, name: &str) -> Result<Option<PathBuf>> {
    args.value_of(name).map(absolute_path).transpose()
}

fn format_arg(args: &ArgMatches) -> Result<SmimeFormat> {
    Ok(SmimeFormat::from_str(
        args.value_of("format").unwrap_or("SMIME"),
    )?)
}

fn timeout_arg(args: &ArgMatches) -> Result<Option<Duration>> {
    args.value_of("timeout")
        .map(|value| {
            u64::from_str(value)
                .map(Duration::from_secs)
                .with_context(|| format!("parsing timeout value {}", value))
        })
        .transpose()
}

fn add_common_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("signer_cert")
                .long("signer-cert")
                .takes_value(true)
                .required(true)
                .help("Path to PEM encoded signer certificate"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .takes_value(true)
                .possible_values(["SMIME", "PEM", "DER"])
                .default_value("SMIME")
                .help("Encoding of the signature"),
        )
        .arg(
            Arg::new("openssl")
                .long("openssl")
                .takes_value(true)
                .help("openssl executable to run"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .takes_value(true)
                .help("Kill openssl after this many seconds"),
        )
}

fn command_sign(args: &ArgMatches) -> Result<()> {
    let mut sign = SmimeSign::new(
        required_path(args, "signer_cert")?,
        required_path(args, "signer_key")?,
    );
    sign.output_format(format_arg(args)?);

    if let Some(path) = optional_path(args, "cert_chain")? {
        sign.certificate_chain(path);
    }
    if let Some(path) = optional_path(args, "recipient_cert")? {
        sign.recipient_certificate(path);
    }
    if let Some(path) = args.value_of("openssl") {
        sign.openssl_program(path);
    }
    sign.timeout(timeout_arg(args)?);

    let input = args
        .value_of("input_path")
        .ok_or_else(|| anyhow!("missing input path"))?;

    let content = if input == "-" {
        let mut buffer = vec![];
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("reading content from stdin")?;
        buffer
    } else {
        std::fs::read(input).with_context(|| format!("reading {}", input))?
    };

    let signature = sign.run(&content)?;

    if let Some(output) = args.value_of("output") {
        info!("writing signature to {}", output);
        std::fs::write(output, &signature).with_context(|| format!("writing {}", output))?;
    } else {
        std::io::stdout()
            .write_all(&signature)
            .context("writing signature to stdout")?;
    }

    Ok(())
}

fn command_verify(args: &ArgMatches) -> Result<()> {
    let mut verify = SmimeVerify::new(
        required_path(args, "signer_cert")?,
        required_path(args, "content")?,
        required_path(args, "signature")?,
    );
    verify.signature_format(format_arg(args)?);

    if let Some(path) = args.value_of("openssl") {
        verify.openssl_program(path);
    }
    verify.timeout(timeout_arg(args)?);

    match verify.run_detailed()? {
        SmimeVerification::Verified => {
            eprintln!("signature verified");
            Ok(())
        }
        SmimeVerification::SignatureRejected { stderr } => {
            Err(anyhow!("signature rejected: {}", stderr))
        }
        SmimeVerification::InvocationFailed { code, stderr } => Err(anyhow!(
            "openssl could not verify the signature (exit code {:?}): {}",
            code,
            stderr
        )),
    }
}

fn main_impl() -> Result<()> {
    let app = Command::new("S/MIME signing via openssl")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gregory Szorc <gregory.szorc@gmail.com>")
        .about("Sign and verify content with detached S/MIME signatures")
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .multiple_occurrences(true)
                .help("Increase logging verbosity. Can be specified multiple times."),
        );

    let app = app.subcommand(
        add_common_args(
            Command::new("sign")
                .about("Sign content")
                .long_about(SIGN_ABOUT),
        )
        .arg(
            Arg::new("signer_key")
                .long("signer-key")
                .takes_value(true)
                .required(true)
                .help("Path to PEM encoded private key of the signer"),
        )
        .arg(
            Arg::new("cert_chain")
                .long("cert-chain")
                .takes_value(true)
                .help("Path to intermediate certificates to include in the signature"),
        )
        .arg(
            Arg::new("recipient_cert")
                .long("recipient-cert")
                .takes_value(true)
                .help("Path to recipient certificate"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .takes_value(true)
                .help("Path to write the signature to"),
        )
        .arg(
            Arg::new("input_path")
                .required(true)
                .help("Path to content to sign, or - for stdin"),
        ),
    );

    let app = app.subcommand(
        add_common_args(
            Command::new("verify")
                .about("Verify a detached signature")
                .long_about(VERIFY_ABOUT),
        )
        .arg(
            Arg::new("content")
                .long("content")
                .takes_value(true)
                .required(true)
                .help("Path to the signed content"),
        )
        .arg(
            Arg::new("signature")
                .long("signature")
                .takes_value(true)
                .required(true)
                .help("Path to the signature"),
        ),
    );

    let matches = app.get_matches();

    let log_level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();

    match matches.subcommand() {
        Some(("sign", args)) => command_sign(args),
        Some(("verify", args)) => command_verify(args),
        _ => Err(anyhow!("unknown command")),
    }
}

fn main() {
    let exit_code = match main_impl() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };

    std::process::exit(exit_code)
}
