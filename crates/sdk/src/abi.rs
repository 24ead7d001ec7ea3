//! Bindings of the staking protocol contracts.
//!
//! Only the subset of functions used by the SDK is declared.

alloy::sol! {
    /// Staking entry point and protocol-wide limits.
    #[sol(rpc)]
    interface StakingManager {
        function stake() external payable;
        function minStakeAmount() external view returns (uint256);
        function maxStakeAmount() external view returns (uint256);
        function stakingLimit() external view returns (uint256);
        function totalStaked() external view returns (uint256);
    }

    /// Derived (receipt) token.
    #[sol(rpc)]
    interface DerivedToken {
        function balanceOf(address account) external view returns (uint256);
    }

    /// Base to derived asset rate converter.
    #[sol(rpc)]
    interface StakingAccountant {
        function HYPEToKHYPE(uint256 hypeAmount) external view returns (uint256);
    }
}
