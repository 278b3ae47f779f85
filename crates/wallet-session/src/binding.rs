//! Contract binding
//!
//! A `ContractHandle` is bound to `(contract address, interface, signer)` and
//! never changes after construction. A different signer needs a new handle.
//!
//! The handle checks only type and shape against the interface description.
//! Domain rules ("only the owner may freeze") are the contract's business and
//! come back as reverts.

use crate::domain::{AbiFunction, AbiValue, ContractInterface};
use crate::error::{BindingError, CallError};
use crate::ports::outbound::{ContractCall, TxReceipt, WalletProvider};
use shared_types::{Address, TxHash};
use std::fmt;
use std::sync::Arc;

/// Callable capability for one deployed contract and one signing identity
pub struct ContractHandle<P: ?Sized> {
    address: Address,
    interface: Arc<ContractInterface>,
    signer: Address,
    provider: Arc<P>,
}

impl<P: ?Sized> Clone for ContractHandle<P> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            interface: Arc::clone(&self.interface),
            signer: self.signer.clone(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: ?Sized> fmt::Debug for ContractHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", &self.address)
            .field("signer", &self.signer)
            .field("functions", &self.interface.len())
            .finish()
    }
}

/// Bind a contract handle.
///
/// Fails if `address` is not a well-formed 20-byte address or no signer is
/// available.
pub fn bind<P: WalletProvider + ?Sized>(
    address: &str,
    interface: Arc<ContractInterface>,
    signer: Option<Address>,
    provider: Arc<P>,
) -> Result<ContractHandle<P>, BindingError> {
    let malformed = |reason: String| BindingError::MalformedAddress {
        address: address.to_string(),
        reason,
    };
    let parsed = Address::parse(address).map_err(|e| malformed(e.to_string()))?;
    if !parsed.is_full_length() {
        return Err(malformed("expected 40 hex digits".to_string()));
    }
    let signer = signer.ok_or(BindingError::MissingSigner)?;

    Ok(ContractHandle {
        address: parsed,
        interface,
        signer,
        provider,
    })
}

impl<P: WalletProvider + ?Sized> ContractHandle<P> {
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn signer(&self) -> &Address {
        &self.signer
    }

    pub fn interface(&self) -> &ContractInterface {
        &self.interface
    }

    /// Whether the interface declares `function`.
    pub fn supports(&self, function: &str) -> bool {
        self.interface.declares(function)
    }

    /// Shape-check a call without issuing it.
    pub fn prepare(
        &self,
        function: &str,
        args: Vec<AbiValue>,
        read_only: bool,
    ) -> Result<ContractCall, CallError> {
        let declared = self
            .interface
            .function(function)
            .ok_or_else(|| CallError::UnknownFunction(function.to_string()))?;

        if declared.is_read_only() != read_only {
            return Err(CallError::WrongMutability {
                function: function.to_string(),
                expected: if read_only { "read-only" } else { "state-changing" },
            });
        }
        check_args(declared, &args)?;

        Ok(ContractCall {
            contract: self.address.clone(),
            from: self.signer.clone(),
            function: declared.name.clone(),
            selector: declared.selector(),
            args,
        })
    }

    /// Issue a read-only query.
    pub async fn query(&self, function: &str, args: Vec<AbiValue>) -> Result<AbiValue, CallError> {
        let call = self.prepare(function, args, true)?;
        let value = self.provider.call(call).await?;

        let matches_output = self
            .interface
            .function(function)
            .and_then(|f| f.outputs.first())
            .is_some_and(|output| output.ty.accepts(&value));
        if !matches_output {
            return Err(CallError::UnexpectedOutput {
                function: function.to_string(),
            });
        }
        Ok(value)
    }

    /// Sign and broadcast a state-changing call.
    pub async fn submit(&self, function: &str, args: Vec<AbiValue>) -> Result<TxHash, CallError> {
        let call = self.prepare(function, args, false)?;
        tracing::debug!(
            contract = %self.address,
            signer = %self.signer,
            function = %call.function,
            "Submitting transaction"
        );
        Ok(self.provider.send_transaction(call).await?)
    }

    /// Wait for a submitted transaction to reach `confirmations`.
    pub async fn wait(&self, tx: TxHash, confirmations: u64) -> Result<TxReceipt, CallError> {
        Ok(self.provider.wait_for_receipt(tx, confirmations).await?)
    }
}

fn check_args(function: &AbiFunction, args: &[AbiValue]) -> Result<(), CallError> {
    if function.inputs.len() != args.len() {
        return Err(CallError::ArityMismatch {
            function: function.name.clone(),
            expected: function.inputs.len(),
            actual: args.len(),
        });
    }
    for (index, (param, value)) in function.inputs.iter().zip(args).enumerate() {
        if !param.ty.accepts(value) {
            return Err(CallError::TypeMismatch {
                function: function.name.clone(),
                index,
                expected: param.ty.to_string(),
            });
        }
    }
    Ok(())
}
